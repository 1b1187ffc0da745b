#![deny(missing_docs)]

//! # Type Resolver
//!
//! Resolves an argument expression to a concrete, qualified type key,
//! consulting the enclosing node's type-parameter map, the edge's
//! param/arg map, and (for identifiers) the external
//! [`VariableOriginTracer`]. Never fails: unknown resolutions fall back
//! to the argument's own declared type, or the empty string.

use crate::callgraph::{ArgKind, CallArgument, Metadata};
use crate::tree::TrackerNodeRef;
use crate::variable_tracer::VariableOriginTracer;
use std::collections::HashMap;

/// Resolves `arg`, observed at `node` (if any), to a concrete type key.
pub fn resolve_argument_type(
    arg: &CallArgument,
    node: Option<&dyn TrackerNodeRef>,
    meta: &Metadata,
    tracer: &dyn VariableOriginTracer,
) -> String {
    let name = meta.get_string(arg.name);

    if let Some(node) = node {
        if !name.is_empty() {
            if let Some(concrete) = node.type_param_map().get(name) {
                return concrete.clone();
            }
        }
        if let Some(edge) = node.edge() {
            if !name.is_empty() {
                if let Some(concrete) = edge.type_param_map.get(name) {
                    return concrete.clone();
                }
            }
            if let Some(&arg_idx) = edge.param_arg_map.get(name) {
                if let Some(mapped) = edge.arguments.get(arg_idx) {
                    return resolve_argument_type(mapped, Some(node), meta, tracer);
                }
            }
        }
    }

    if matches!(arg.kind, Some(ArgKind::Identifier)) && !name.is_empty() {
        if let Some(node) = node {
            if let Some(edge) = node.edge() {
                let caller_name = meta.get_string(edge.caller.name);
                let caller_pkg = meta.get_string(edge.caller.pkg);
                let origin = tracer.trace(name, caller_name, caller_pkg, meta);
                if let Some(ty) = origin.concrete_type {
                    return ty;
                }
                if origin.name != name {
                    return origin.name;
                }
            }
        }
    }

    resolve_by_kind(arg, meta)
}

fn resolve_by_kind(arg: &CallArgument, meta: &Metadata) -> String {
    let declared = meta.get_string(arg.type_);
    match arg.kind {
        Some(ArgKind::Identifier) => {
            if !declared.is_empty() {
                return declared.to_string();
            }
            let pkg = meta.get_string(arg.pkg);
            let name = meta.get_string(arg.name);
            if !pkg.is_empty() {
                if let Some(var) = meta.find_variable(pkg, name) {
                    return var.type_.clone();
                }
            }
            String::new()
        }
        Some(ArgKind::Selector) => {
            let base_ty = arg.x.as_deref().map(|x| resolve_by_kind(x, meta)).unwrap_or_default();
            let field = meta.get_string(arg.sel);
            let (pkg, type_name) = split_qualified(&base_ty);
            if let Some(ty_def) = meta.find_type(pkg, type_name) {
                if let crate::callgraph::TypeKind::Struct { fields } = &ty_def.kind {
                    if let Some(f) = fields.iter().find(|f| f.name == field) {
                        return f.type_.clone();
                    }
                }
            }
            String::new()
        }
        Some(ArgKind::Call) => {
            let base = arg.fun.as_deref().map(|f| resolve_by_kind(f, meta)).unwrap_or_default();
            extract_return_type(&base).unwrap_or(base)
        }
        Some(ArgKind::Unary) | Some(ArgKind::Star) => {
            arg.x.as_deref().map(|x| strip_one_pointer(&resolve_by_kind(x, meta))).unwrap_or_default()
        }
        Some(ArgKind::CompositeLit) => {
            if !declared.is_empty() { declared.to_string() } else { arg.x.as_deref().map(|x| resolve_by_kind(x, meta)).unwrap_or_default() }
        }
        Some(ArgKind::Index) => {
            let base = arg.x.as_deref().map(|x| resolve_by_kind(x, meta)).unwrap_or_default();
            element_type(&base)
        }
        Some(ArgKind::MapType) => {
            let key = arg.x.as_deref().map(|x| resolve_by_kind(x, meta)).unwrap_or_default();
            let value = arg.fun.as_deref().map(|f| resolve_by_kind(f, meta)).unwrap_or_default();
            format!("map[{key}]{value}")
        }
        Some(ArgKind::InterfaceType) => "interface{}".to_string(),
        Some(ArgKind::Literal) => declared.to_string(),
        Some(ArgKind::Raw) => meta.get_string(arg.raw).to_string(),
        _ => declared.to_string(),
    }
}

fn split_qualified(ty: &str) -> (&str, &str) {
    match ty.rsplit_once("-->") {
        Some((pkg, name)) => (pkg, name),
        None => ("", ty),
    }
}

fn strip_one_pointer(ty: &str) -> String {
    ty.strip_prefix('*').unwrap_or(ty).to_string()
}

fn element_type(ty: &str) -> String {
    if let Some(rest) = ty.strip_prefix("[]") {
        return rest.to_string();
    }
    if let Some(rest) = ty.strip_prefix("map[") {
        if let Some(close) = rest.find(']') {
            return rest[close + 1..].to_string();
        }
    }
    String::new()
}

/// Parses a `func(...) R` signature string and extracts `R`, if the
/// string parses as one.
fn extract_return_type(sig: &str) -> Option<String> {
    let sig = sig.trim();
    if !sig.starts_with("func(") {
        return None;
    }
    let close = find_matching_paren(sig, sig.find('(')?)?;
    let ret = sig[close + 1..].trim();
    if ret.is_empty() {
        None
    } else {
        Some(ret.to_string())
    }
}

fn find_matching_paren(s: &str, open_idx: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(open_idx) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Substitutes each listed parameter inside a `Base[P1, P2, ...]`
/// template, recursing into nested brackets.
pub fn resolve_generic_type(template: &str, params: &HashMap<String, String>) -> String {
    let Some(open) = template.find('[') else { return template.to_string() };
    if !template.ends_with(']') {
        return template.to_string();
    }
    let base = &template[..open];
    let inner = &template[open + 1..template.len() - 1];
    let parts = split_type_parameters(inner);
    let substituted: Vec<String> = parts
        .iter()
        .map(|p| {
            let p = p.trim();
            if let Some(concrete) = params.get(p) {
                concrete.clone()
            } else if p.contains('[') {
                resolve_generic_type(p, params)
            } else {
                p.to_string()
            }
        })
        .collect();
    format!("{base}[{}]", substituted.join(", "))
}

/// Parses a bracketed generic suffix into an ordered `{paramName ->
/// argText}` map, in left-to-right order.
pub fn extract_type_parameters(name: &str) -> Vec<(String, String)> {
    let Some(open) = name.find('[') else { return Vec::new() };
    if !name.ends_with(']') {
        return Vec::new();
    }
    let inner = &name[open + 1..name.len() - 1];
    split_type_parameters(inner)
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!("T{}", i + 1), v))
        .collect()
}

/// Splits a comma-delimited type-parameter list, respecting nested
/// brackets (so `A[B, C], D` splits into `["A[B, C]", " D"]`).
pub fn split_type_parameters(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in s.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() || !parts.is_empty() {
        parts.push(current);
    }
    parts.into_iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_nested_brackets() {
        let parts = split_type_parameters("A[B, C], D");
        assert_eq!(parts, vec!["A[B, C]".to_string(), "D".to_string()]);
    }

    #[test]
    fn resolve_generic_substitutes_each_parameter() {
        let mut params = HashMap::new();
        params.insert("T".to_string(), "pkg-->User".to_string());
        assert_eq!(resolve_generic_type("Container[T]", &params), "Container[pkg-->User]");
    }

    #[test]
    fn resolve_generic_recurses_into_nested_brackets() {
        let mut params = HashMap::new();
        params.insert("T".to_string(), "pkg-->User".to_string());
        assert_eq!(resolve_generic_type("Outer[Inner[T]]", &params), "Outer[Inner[pkg-->User]]");
    }

    #[test]
    fn extract_type_parameters_parses_bracket_list() {
        let params = extract_type_parameters("Container[pkg-->User, int]");
        assert_eq!(params, vec![("T1".to_string(), "pkg-->User".to_string()), ("T2".to_string(), "int".to_string())]);
    }

    #[test]
    fn extract_return_type_parses_function_signature() {
        assert_eq!(extract_return_type("func(*gin.Context) pkg-->User"), Some("pkg-->User".to_string()));
        assert_eq!(extract_return_type("not a func"), None);
    }

    #[test]
    fn element_type_unwraps_slice_and_map() {
        assert_eq!(element_type("[]pkg-->User"), "pkg-->User");
        assert_eq!(element_type("map[string]pkg-->User"), "pkg-->User");
    }
}
