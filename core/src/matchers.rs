#![deny(missing_docs)]

//! # Pattern Matchers
//!
//! The five matcher kinds (Route/Mount/Request/Response/Param). Each
//! configured pattern (`patterns.rs`) implements the matcher trait for
//! its kind directly, so the Extractor can hold homogeneous `&dyn`
//! slices per kind and dispatch dynamically, while the patterns
//! themselves remain plain `serde`-deserializable config data.

use crate::callgraph::{ArgKind, CallArgument, CallGraphEdge, Metadata};
use crate::context::ContextProvider;
use crate::patterns::{MountPattern, ParamPattern, RequestPattern, ResponsePattern, RoutePattern};
use crate::resolver::resolve_argument_type;
use crate::route_info::{ParamInfo, ParamSource, RequestInfo, ResponseInfo};
use crate::schema_mapper;
use crate::tree::TrackerNodeRef;
use crate::variable_tracer::VariableOriginTracer;
use indexmap::IndexMap;
use serde_json::json;

/// Everything a matcher needs to test and extract against one node,
/// bundled so trait methods stay short argument lists.
pub struct MatchCtx<'a> {
    /// The node under consideration.
    pub node: &'a dyn TrackerNodeRef,
    /// The input metadata.
    pub meta: &'a Metadata,
    /// The context provider over `meta`.
    pub ctx: &'a ContextProvider<'a>,
    /// The variable-origin oracle.
    pub tracer: &'a dyn VariableOriginTracer,
    /// The HTTP method of the route this node is a descendant of, when
    /// matching a request/response/param pattern inside a route's
    /// subtree; `None` for route/mount matching itself.
    pub current_method: Option<&'a str>,
}

impl<'a> MatchCtx<'a> {
    fn edge(&self) -> Option<&'a CallGraphEdge> {
        self.node.edge()
    }

    fn callee(&self) -> (String, String, String) {
        self.ctx.callee_info(self.edge())
    }

    fn caller(&self) -> (String, String, String) {
        self.ctx.caller_info(self.edge())
    }

    fn arg(&self, idx: i32) -> Option<&'a CallArgument> {
        if idx < 0 {
            return None;
        }
        self.edge()?.arguments.get(idx as usize)
    }

    fn arg_text(&self, idx: i32) -> String {
        self.arg(idx).map(|a| self.ctx.argument_info(a)).unwrap_or_default()
    }

    fn arg_type(&self, idx: i32) -> String {
        match self.arg(idx) {
            Some(a) => resolve_argument_type(a, Some(self.node), self.meta, self.tracer),
            None => String::new(),
        }
    }
}

/// One fully-resolved route call site, ready for the Extractor to turn
/// into a `RouteInfo`.
#[derive(Debug, Clone, Default)]
pub struct RouteExtract {
    /// The path-template text.
    pub path: String,
    /// The handler's simple name (after origin tracing, if applicable).
    pub handler: String,
    /// The handler's owning package.
    pub package: String,
    /// The resolved HTTP method.
    pub method: String,
}

/// A configured route pattern, able to test and extract against a node.
pub trait RouteMatcher {
    /// Whether this pattern matches the node in `ctx`.
    fn matches(&self, ctx: &MatchCtx) -> bool;
    /// This pattern's match priority.
    fn priority(&self) -> u32;
    /// Extracts the route-level fields this pattern prescribes.
    fn extract(&self, ctx: &MatchCtx) -> RouteExtract;
}

impl RouteMatcher for RoutePattern {
    fn matches(&self, ctx: &MatchCtx) -> bool {
        let (callee_name, callee_pkg, callee_recv) = ctx.callee();
        let (_, caller_func, _) = ctx.caller();
        self.selectors.matches(&callee_name, &caller_func, &callee_pkg, &callee_recv)
    }

    fn priority(&self) -> u32 {
        self.selectors.priority()
    }

    fn extract(&self, ctx: &MatchCtx) -> RouteExtract {
        let path = ctx.arg_text(self.path_arg_index);
        let (callee_name, _, _) = ctx.callee();

        let handler_arg = ctx.arg(self.handler_arg_index);
        let mut handler = handler_arg.map(|a| ctx.meta.get_string(a.name).to_string()).unwrap_or_default();
        let mut package = handler_arg
            .map(|a| {
                let pkg = ctx.meta.get_string(a.pkg);
                if !pkg.is_empty() {
                    pkg.to_string()
                } else {
                    a.fun.as_ref().map(|f| ctx.meta.get_string(f.pkg).to_string()).unwrap_or_default()
                }
            })
            .unwrap_or_default();

        if let Some(arg) = handler_arg {
            if matches!(arg.kind, Some(ArgKind::Identifier)) && !handler.is_empty() {
                let (caller_name, caller_pkg, _) = ctx.caller();
                let origin = ctx.tracer.trace(&handler, &caller_name, &caller_pkg, ctx.meta);
                if origin.name != handler || !origin.pkg.is_empty() {
                    handler = origin.name;
                    package = origin.pkg;
                }
            }
        }

        let method = if self.method_from_call {
            schema_mapper::method_from_name(&callee_name).unwrap_or_default().to_string()
        } else if let Some(cfg) = &self.method_extraction {
            cfg.method_for(&handler)
        } else {
            schema_mapper::method_from_name(&callee_name).unwrap_or_default().to_string()
        };

        RouteExtract { path, handler, package, method }
    }
}

/// One fully-resolved mount call site.
#[derive(Debug, Clone, Default)]
pub struct MountExtract {
    /// The extracted mount path segment.
    pub path: String,
    /// Textual form of the router argument.
    pub router_arg_text: String,
    /// The router argument itself, for origin tracing.
    pub router_arg: Option<CallArgument>,
}

/// A configured mount pattern.
pub trait MountMatcher {
    /// Whether this pattern matches the node in `ctx`.
    fn matches(&self, ctx: &MatchCtx) -> bool;
    /// This pattern's match priority.
    fn priority(&self) -> u32;
    /// Extracts the mount-level fields this pattern prescribes.
    fn extract(&self, ctx: &MatchCtx) -> MountExtract;
}

impl MountMatcher for MountPattern {
    fn matches(&self, ctx: &MatchCtx) -> bool {
        if !self.is_mount {
            return false;
        }
        let (callee_name, callee_pkg, callee_recv) = ctx.callee();
        let (_, caller_func, _) = ctx.caller();
        self.selectors.matches(&callee_name, &caller_func, &callee_pkg, &callee_recv)
    }

    fn priority(&self) -> u32 {
        self.selectors.priority()
    }

    fn extract(&self, ctx: &MatchCtx) -> MountExtract {
        let path = ctx.arg_text(self.path_arg_index);
        let router_arg = ctx.arg(self.router_arg_index).cloned();
        let router_arg_text = ctx.arg_text(self.router_arg_index);
        MountExtract { path, router_arg_text, router_arg }
    }
}

/// A configured request-body pattern.
pub trait RequestMatcher {
    /// Whether this pattern matches the node in `ctx`.
    fn matches(&self, ctx: &MatchCtx) -> bool;
    /// This pattern's match priority.
    fn priority(&self) -> u32;
    /// Extracts the request body, when one can be determined.
    fn extract(&self, ctx: &MatchCtx) -> Option<RequestInfo>;
}

impl RequestMatcher for RequestPattern {
    fn matches(&self, ctx: &MatchCtx) -> bool {
        if !self.allow_for_get_methods {
            if let Some(method) = ctx.current_method {
                if matches!(method, "GET" | "HEAD" | "DELETE") {
                    return false;
                }
            }
        }
        let (callee_name, callee_pkg, callee_recv) = ctx.callee();
        let (_, caller_func, _) = ctx.caller();
        self.selectors.matches(&callee_name, &caller_func, &callee_pkg, &callee_recv)
    }

    fn priority(&self) -> u32 {
        self.selectors.priority()
    }

    fn extract(&self, ctx: &MatchCtx) -> Option<RequestInfo> {
        let mut ty = ctx.arg_type(self.type_arg_index);
        if self.deref {
            ty = ty.strip_prefix('*').unwrap_or(&ty).to_string();
        }
        if ty.is_empty() {
            return None;
        }
        let schema = schema_mapper::map_type_to_schema(&ty);
        Some(RequestInfo { content_type: self.content_type.clone(), body_type: ty, schema })
    }
}

/// A configured response pattern.
pub trait ResponseMatcher {
    /// Whether this pattern matches the node in `ctx`.
    fn matches(&self, ctx: &MatchCtx) -> bool;
    /// This pattern's match priority.
    fn priority(&self) -> u32;
    /// Extracts one response entry, when one can be determined.
    fn extract(&self, ctx: &MatchCtx) -> Option<ResponseInfo>;
}

impl ResponseMatcher for ResponsePattern {
    fn matches(&self, ctx: &MatchCtx) -> bool {
        let (callee_name, callee_pkg, callee_recv) = ctx.callee();
        let (_, caller_func, _) = ctx.caller();
        self.selectors.matches(&callee_name, &caller_func, &callee_pkg, &callee_recv)
    }

    fn priority(&self) -> u32 {
        self.selectors.priority()
    }

    fn extract(&self, ctx: &MatchCtx) -> Option<ResponseInfo> {
        let status_code = if self.status_from_arg {
            let raw = ctx.arg_text(self.status_arg_index);
            let (code, ok) = schema_mapper::parse_status_code(&raw);
            if ok {
                code
            } else {
                self.fixed_status
            }
        } else {
            self.fixed_status
        };

        let type_arg = if self.type_from_arg { ctx.arg(self.type_arg_index) } else { None };
        let (body_type, schema) = match type_arg {
            Some(arg) if matches!(arg.kind, Some(ArgKind::Literal)) => {
                let raw = ctx.meta.get_string(arg.value);
                (schema_mapper::literal_type_name(raw).to_string(), schema_mapper::literal_schema(raw))
            }
            Some(_) => {
                let ty = ctx.arg_type(self.type_arg_index);
                (ty.clone(), if ty.is_empty() { json!({}) } else { schema_mapper::map_type_to_schema(&ty) })
            }
            None => (String::new(), json!({})),
        };

        if body_type.is_empty() && !self.type_from_arg {
            return None;
        }

        Some(ResponseInfo { status_code, content_type: self.content_type.clone(), body_type, schema })
    }
}

/// A configured parameter pattern.
pub trait ParamMatcher {
    /// Whether this pattern matches the node in `ctx`.
    fn matches(&self, ctx: &MatchCtx) -> bool;
    /// This pattern's match priority.
    fn priority(&self) -> u32;
    /// Extracts one parameter, when one can be determined.
    fn extract(&self, ctx: &MatchCtx) -> Option<ParamInfo>;
}

impl ParamMatcher for ParamPattern {
    fn matches(&self, ctx: &MatchCtx) -> bool {
        let (callee_name, callee_pkg, callee_recv) = ctx.callee();
        let (_, caller_func, _) = ctx.caller();
        self.selectors.matches(&callee_name, &caller_func, &callee_pkg, &callee_recv)
    }

    fn priority(&self) -> u32 {
        self.selectors.priority()
    }

    fn extract(&self, ctx: &MatchCtx) -> Option<ParamInfo> {
        let name = ctx.arg_text(self.name_arg_index);
        if name.is_empty() {
            return None;
        }
        let location = match self.param_in.as_str() {
            "query" => ParamSource::Query,
            "header" => ParamSource::Header,
            "cookie" => ParamSource::Cookie,
            "form" => ParamSource::Form,
            _ => ParamSource::Path,
        };
        let required = matches!(location, ParamSource::Path);
        Some(ParamInfo { name, location, required, schema: json!({"type": "string"}), extensions: IndexMap::new() })
    }
}

/// Picks the highest-priority element of `candidates`, falling back to
/// configuration order on ties (first wins, since `max_by_key` keeps the
/// later equal element — we therefore scan left-to-right ourselves).
pub fn pick_highest_priority<'a, T, F>(candidates: &'a [T], priority_of: F) -> Option<&'a T>
where
    F: Fn(&'a T) -> u32,
{
    let mut best: Option<(&T, u32)> = None;
    for candidate in candidates {
        let p = priority_of(candidate);
        match &best {
            Some((_, best_p)) if *best_p >= p => {}
            _ => best = Some((candidate, p)),
        }
    }
    best.map(|(c, _)| c)
}

/// Picks the highest-priority pattern among those that actually match
/// `ctx`, falling back to configuration order on ties. Priority only
/// breaks ties between competing matches of the *same* kind (§4.4); a
/// higher-priority pattern that does not match this node must never
/// suppress a lower-priority pattern that does.
pub fn pick_best_match<'a, T>(
    candidates: &'a [T],
    ctx: &MatchCtx,
    matches: impl Fn(&'a T, &MatchCtx) -> bool,
    priority_of: impl Fn(&'a T) -> u32,
) -> Option<&'a T> {
    let mut best: Option<(&'a T, u32)> = None;
    for candidate in candidates {
        if !matches(candidate, ctx) {
            continue;
        }
        let p = priority_of(candidate);
        match &best {
            Some((_, best_p)) if *best_p >= p => {}
            _ => best = Some((candidate, p)),
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod pick_best_match_tests {
    use super::*;
    use crate::callgraph::{CallGraphEdge, EdgeEndpoint, Metadata};
    use crate::context::ContextProvider;
    use crate::patterns::{RoutePattern, Selectors};
    use crate::strings::StringPool;
    use crate::tree::InMemoryNode;
    use crate::variable_tracer::AssignmentMapTracer;

    #[test]
    fn a_non_matching_higher_priority_pattern_does_not_suppress_a_lower_priority_match() {
        let mut meta = Metadata::default();
        meta.pool = StringPool::new(vec!["GET".into(), "pkg".into()]);
        let edge = CallGraphEdge { callee: EdgeEndpoint { name: 1, pkg: 2, recv_type: 0 }, ..Default::default() };
        let node = InMemoryNode { key: "n".into(), edge: Some(edge), ..Default::default() };
        let ctx_provider = ContextProvider::new(&meta);
        let tracer = AssignmentMapTracer;
        let match_ctx = MatchCtx { node: &node, meta: &meta, ctx: &ctx_provider, tracer: &tracer, current_method: None };

        let high_priority_no_match = RoutePattern {
            selectors: Selectors { call_regex: Some("^POST$".into()), function_name_regex: Some("^unused$".into()), ..Default::default() },
            ..Default::default()
        };
        let low_priority_match = RoutePattern {
            selectors: Selectors { call_regex: Some("^GET$".into()), ..Default::default() },
            ..Default::default()
        };
        let patterns = vec![high_priority_no_match, low_priority_match];

        let picked = pick_best_match(&patterns, &match_ctx, RouteMatcher::matches, RouteMatcher::priority);
        assert!(picked.is_some());
        assert_eq!(picked.unwrap().selectors.call_regex.as_deref(), Some("^GET$"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_highest_priority_is_stable_on_ties() {
        let items = vec![("a", 5u32), ("b", 5u32), ("c", 2u32)];
        let picked = pick_highest_priority(&items, |(_, p)| *p);
        assert_eq!(picked.unwrap().0, "a");
    }

    #[test]
    fn pick_highest_priority_picks_max() {
        let items = vec![("a", 1u32), ("b", 9u32), ("c", 2u32)];
        let picked = pick_highest_priority(&items, |(_, p)| *p);
        assert_eq!(picked.unwrap().0, "b");
    }

    #[test]
    fn handler_origin_trace_is_keyed_on_the_registering_caller_not_the_handlers_own_package() {
        use crate::callgraph::{CallGraphEdge, EdgeEndpoint};
        use crate::context::ContextProvider;
        use crate::patterns::{RoutePattern, Selectors};
        use crate::strings::StringPool;
        use crate::tree::InMemoryNode;
        use crate::variable_tracer::Origin;
        use std::cell::RefCell;

        struct RecordingTracer {
            seen: RefCell<Vec<(String, String)>>,
        }
        impl VariableOriginTracer for RecordingTracer {
            fn trace(&self, name: &str, caller_name: &str, caller_pkg: &str, _meta: &Metadata) -> Origin {
                self.seen.borrow_mut().push((caller_name.to_string(), caller_pkg.to_string()));
                Origin { name: name.to_string(), pkg: caller_pkg.to_string(), concrete_type: None, origin_func: None }
            }
        }

        // pool: 1="registerRoutes" 2="main" 3="GET" 4="gin" 5="listUsers" 6="handlers"
        let mut meta = Metadata::default();
        meta.pool = StringPool::new(vec!["registerRoutes".into(), "main".into(), "GET".into(), "gin".into(), "listUsers".into(), "handlers".into()]);
        let edge = CallGraphEdge {
            caller: EdgeEndpoint { name: 1, pkg: 2, recv_type: 0 },
            callee: EdgeEndpoint { name: 3, pkg: 4, recv_type: 0 },
            arguments: vec![CallArgument { kind: Some(ArgKind::Identifier), name: 5, pkg: 6, ..Default::default() }],
            ..Default::default()
        };
        let node = InMemoryNode { key: "n".into(), edge: Some(edge), ..Default::default() };
        let ctx_provider = ContextProvider::new(&meta);
        let tracer = RecordingTracer { seen: RefCell::new(Vec::new()) };
        let match_ctx = MatchCtx { node: &node, meta: &meta, ctx: &ctx_provider, tracer: &tracer, current_method: None };

        let pattern = RoutePattern {
            selectors: Selectors { call_regex: Some("^GET$".into()), ..Default::default() },
            path_arg_index: -1,
            handler_arg_index: 0,
            method_from_call: true,
            method_extraction: None,
        };

        let _ = RouteMatcher::extract(&pattern, &match_ctx);
        assert_eq!(tracer.seen.borrow().as_slice(), [("registerRoutes".to_string(), "main".to_string())]);
    }
}
