#![deny(missing_docs)]

//! # apispec-core
//!
//! Static OpenAPI extraction from a pre-built call graph: no source is
//! parsed or executed here, only the interned metadata and tracker tree
//! an external analyzer already produced.

/// Shared error types.
pub mod error;

/// Interned string pool.
pub mod strings;

/// Call graph & metadata model.
pub mod callgraph;

/// Tracker tree forest abstraction.
pub mod tree;

/// Context Provider: edge/argument text resolution.
pub mod context;

/// Pure type-name/status/method lexicon mapping.
pub mod schema_mapper;

/// Type Resolver: best-effort argument type resolution.
pub mod resolver;

/// Variable-origin tracing oracle.
pub mod variable_tracer;

/// Pattern configuration DSL and the shared regex cache.
pub mod patterns;

/// The five matcher-kind trait implementations.
pub mod matchers;

/// Gitignore-style include/exclude filtering.
pub mod filter;

/// Extracted route/request/response/param records.
pub mod route_info;

/// The tree-walking Extractor.
pub mod extractor;

/// Manual per-function override post-processing.
pub mod override_applier;

/// Type Schema Builder: component schema lowering.
pub mod schema_builder;

/// OpenAPI document assembly.
pub mod assembler;

/// Built-in framework presets.
pub mod presets;

/// Configuration loading and preset overlay.
pub mod config;

pub use callgraph::Metadata;
pub use error::{AppError, AppResult};
pub use extractor::extract_routes;
pub use patterns::{ApiSpecConfig, GeneratorConfig};
pub use route_info::RouteInfo;
pub use tree::{InMemoryTree, TrackerTreeRef};
pub use variable_tracer::{AssignmentMapTracer, VariableOriginTracer};

use std::collections::HashSet;

/// Runs the full pipeline end to end: extracts routes, builds component
/// schemas from the types they reference, and assembles the OpenAPI
/// document.
pub fn run<T: TrackerTreeRef>(tree: &T, config: &ApiSpecConfig, generator: &GeneratorConfig, tracer: &dyn VariableOriginTracer) -> serde_json::Value {
    let routes = extractor::extract_routes(tree, config, tracer);
    let used_types: HashSet<String> = routes.iter().flat_map(|r| r.used_types.iter().cloned()).collect();
    let schemas = schema_builder::build_schemas(&used_types, tree.metadata(), config);
    assembler::assemble(&routes, schemas, config, generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::{Assignment, CallArgument, CallGraphEdge, EdgeEndpoint};
    use crate::patterns::{RoutePattern, Selectors};
    use crate::strings::StringPool;
    use crate::tree::InMemoryNode;
    use std::collections::HashMap;

    #[test]
    fn run_extracts_a_single_route_and_assembles_a_document() {
        let mut pool = StringPool::new();
        let pkg = pool.intern("app");
        let caller_name = pool.intern("registerRoutes");
        let callee_name = pool.intern("GET");
        let handler_name = pool.intern("listUsers");
        let path_val = pool.intern("\"/users\"");

        let edge = CallGraphEdge {
            caller: EdgeEndpoint { name: caller_name, pkg, recv_type: 0 },
            callee: EdgeEndpoint { name: callee_name, pkg, recv_type: 0 },
            arguments: vec![
                CallArgument::literal(path_val),
                CallArgument::identifier(handler_name, 0),
            ],
            assignment_map: HashMap::from([(
                "listUsers".to_string(),
                vec![Assignment { variable_name: "listUsers".into(), concrete_type: String::new(), pkg: "app".into() }],
            )]),
            ..Default::default()
        };

        let node = InMemoryNode { key: "n1".into(), edge: Some(edge), ..Default::default() };
        let tree = crate::tree::InMemoryTree {
            roots: vec!["n1".into()],
            nodes: HashMap::from([("n1".to_string(), node)]),
            metadata: callgraph::Metadata { pool, ..Default::default() },
        };

        let config = ApiSpecConfig {
            routes: vec![RoutePattern {
                selectors: Selectors { call_regex: Some("^GET$".into()), function_name_regex: None, recv_type: None, recv_type_regex: None },
                path_arg_index: 0,
                handler_arg_index: 1,
                method_from_call: true,
                method_extraction: None,
            }],
            ..Default::default()
        };
        let generator = GeneratorConfig::default();
        let tracer = AssignmentMapTracer;

        let doc = run(&tree, &config, &generator, &tracer);
        assert_eq!(doc["paths"]["/users"]["get"]["operationId"], serde_json::json!("app.listUsers"));
    }
}
