#![deny(missing_docs)]

//! # Variable Origin Tracer
//!
//! The one externally-pluggable oracle in the pipeline: given an
//! identifier and the function/package it was observed in, follow
//! assignments across the call graph back to where the value came from.
//! The Type Resolver depends only on the [`VariableOriginTracer`] trait,
//! never on this module's concrete walker, so a test can supply a fake
//! oracle without touching the call graph at all.

use crate::callgraph::Metadata;

/// The resolved origin of one traced variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    /// The variable name at its origin (may equal the input name).
    pub name: String,
    /// The package the origin was found in.
    pub pkg: String,
    /// The concrete type the origin resolves to, if known.
    pub concrete_type: Option<String>,
    /// The function whose body produced the origin, if known.
    pub origin_func: Option<String>,
}

/// The oracle the Type Resolver consults for identifier arguments.
pub trait VariableOriginTracer {
    /// Traces `name`, as observed inside `caller_name`/`caller_pkg`, back
    /// to its origin.
    fn trace(&self, name: &str, caller_name: &str, caller_pkg: &str, meta: &Metadata) -> Origin;
}

/// The default, conservative tracer: scans every edge whose caller
/// matches `(caller_name, caller_pkg)` for an assignment-map entry named
/// `name`, and returns its most recent assignment. Absent an assignment,
/// falls back to the identity origin (same name, same package, no known
/// type).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssignmentMapTracer;

impl VariableOriginTracer for AssignmentMapTracer {
    fn trace(&self, name: &str, caller_name: &str, caller_pkg: &str, meta: &Metadata) -> Origin {
        for edge in &meta.edges {
            let this_caller_name = meta.get_string(edge.caller.name);
            let this_caller_pkg = meta.get_string(edge.caller.pkg);
            if this_caller_name != caller_name || this_caller_pkg != caller_pkg {
                continue;
            }
            if let Some(assignments) = edge.assignment_map.get(name) {
                if let Some(last) = assignments.last() {
                    return Origin {
                        name: last.variable_name.clone(),
                        pkg: if last.pkg.is_empty() { caller_pkg.to_string() } else { last.pkg.clone() },
                        concrete_type: if last.concrete_type.is_empty() { None } else { Some(last.concrete_type.clone()) },
                        origin_func: Some(caller_name.to_string()),
                    };
                }
            }
        }
        Origin { name: name.to_string(), pkg: caller_pkg.to_string(), concrete_type: None, origin_func: None }
    }
}
