#![deny(missing_docs)]

//! # Extractor (core walker)
//!
//! Traverses the [`TrackerTreeRef`] forest depth-first, composing mount
//! prefixes and tag context across nested mount/group scopes, applying
//! the configured matchers with priority, and emitting deduplicated
//! [`RouteInfo`] records. The only mutable state threaded through the
//! walk is the accumulated mount path/tags and the cycle-guarding
//! visited set; everything else is read through borrowed references.

use crate::callgraph::ArgKind;
use crate::context::ContextProvider;
use crate::filter;
use crate::matchers::{
    pick_best_match, MatchCtx, MountMatcher, ParamMatcher, RequestMatcher, ResponseMatcher,
    RouteMatcher,
};
use crate::override_applier::apply_overrides;
use crate::patterns::ApiSpecConfig;
use crate::route_info::{join_mount_path, RouteInfo};
use crate::tree::{NodeKey, TrackerNodeRef, TrackerTreeRef};
use crate::variable_tracer::VariableOriginTracer;
use std::collections::HashSet;

/// Walks every root of `tree`, applying `config`'s patterns, and returns
/// the deduplicated (by declaring function) list of discovered routes.
pub fn extract_routes<T: TrackerTreeRef>(
    tree: &T,
    config: &ApiSpecConfig,
    tracer: &dyn VariableOriginTracer,
) -> Vec<RouteInfo> {
    let meta = tree.metadata();
    let ctx = ContextProvider::new(meta);
    let mut routes: Vec<RouteInfo> = Vec::new();
    let mut visited: HashSet<NodeKey> = HashSet::new();

    for root in tree.roots().to_vec() {
        walk(tree, &root, &ctx, tracer, config, "", &[], &mut visited, &mut routes);
    }

    routes
}

#[allow(clippy::too_many_arguments)]
fn walk<T: TrackerTreeRef>(
    tree: &T,
    key: &str,
    ctx: &ContextProvider,
    tracer: &dyn VariableOriginTracer,
    config: &ApiSpecConfig,
    mount_path: &str,
    mount_tags: &[String],
    visited: &mut HashSet<NodeKey>,
    routes: &mut Vec<RouteInfo>,
) {
    if !visited.insert(key.to_string()) {
        return;
    }
    let Some(node) = tree.find_node_by_key(key) else { return };
    let node_ref: &dyn TrackerNodeRef = node;
    let meta = tree.metadata();

    let match_ctx = MatchCtx { node: node_ref, meta, ctx, tracer, current_method: None };
    let passes_filter = node_passes_filters(&match_ctx, config);

    if passes_filter {
        let mount_hit = pick_best_match(&config.mounts, &match_ctx, MountMatcher::matches, MountMatcher::priority);
        if let Some(pattern) = mount_hit {
            let extract = MountMatcher::extract(pattern, &match_ctx);
            let new_mount_path = join_mount_path(mount_path, &extract.path);
            let new_tags: Vec<String> =
                if !new_mount_path.is_empty() { vec![new_mount_path.clone()] } else { mount_tags.to_vec() };

            if let Some(arg) = &extract.router_arg {
                if matches!(
                    arg.kind,
                    Some(ArgKind::Identifier) | Some(ArgKind::Selector) | Some(ArgKind::Unary) | Some(ArgKind::Call)
                ) {
                    let name = meta.get_string(arg.name);
                    if !name.is_empty() {
                        let (caller_name, caller_pkg, _) = ctx.caller_info(node.edge());
                        let origin = tracer.trace(name, &caller_name, &caller_pkg, meta);
                        if let Some(target) = tree.find_function_node(&origin.name, &origin.pkg) {
                            for child in target.children().to_vec() {
                                walk(tree, &child, ctx, tracer, config, &new_mount_path, &new_tags, visited, routes);
                            }
                        }
                    }
                }
            }

            for child in node.children().to_vec() {
                walk(tree, &child, ctx, tracer, config, &new_mount_path, &new_tags, visited, routes);
            }
            return;
        }

        let route_hit = pick_best_match(&config.routes, &match_ctx, RouteMatcher::matches, RouteMatcher::priority);
        if let Some(pattern) = route_hit {
            let extract = RouteMatcher::extract(pattern, &match_ctx);
            let path = join_mount_path(mount_path, &extract.path);
            let file = meta
                .function_context(&extract.package, &extract.handler)
                .map(|(path, _)| path.to_string())
                .unwrap_or_default();

            let mut route = RouteInfo {
                path,
                method: extract.method,
                handler: extract.handler.clone(),
                function: extract.handler,
                package: extract.package,
                file,
                summary: String::new(),
                tags: mount_tags.to_vec(),
                request: None,
                responses: Default::default(),
                params: Vec::new(),
                used_types: Default::default(),
                group_prefix: mount_path.to_string(),
            };

            collect_children(tree, key, ctx, tracer, config, &route.method.clone(), visited, &mut route);
            apply_overrides(&mut route, &config.overrides);

            if let Some(existing) = routes.iter_mut().find(|r: &&mut RouteInfo| r.function == route.function) {
                *existing = route;
            } else {
                routes.push(route);
            }
            return;
        }
    }

    for child in node.children().to_vec() {
        walk(tree, &child, ctx, tracer, config, mount_path, mount_tags, visited, routes);
    }
}

/// Recursively descends the subtree rooted at `key` (guarded by the same
/// `visited` set as the top-level walk) looking for request/response/
/// param matches to populate onto `route`. Also tried against the route
/// node itself, so single-argument routes are captured.
#[allow(clippy::too_many_arguments)]
fn collect_children<T: TrackerTreeRef>(
    tree: &T,
    key: &str,
    ctx: &ContextProvider,
    tracer: &dyn VariableOriginTracer,
    config: &ApiSpecConfig,
    method: &str,
    visited: &mut HashSet<NodeKey>,
    route: &mut RouteInfo,
) {
    visited.insert(key.to_string());
    let Some(node) = tree.find_node_by_key(key) else { return };
    let node_ref: &dyn TrackerNodeRef = node;
    let meta = tree.metadata();
    let match_ctx = MatchCtx { node: node_ref, meta, ctx, tracer, current_method: Some(method) };

    if route.request.is_none() {
        for pattern in &config.requests {
            if RequestMatcher::matches(pattern, &match_ctx) {
                if let Some(info) = RequestMatcher::extract(pattern, &match_ctx) {
                    route.note_used_type(&info.body_type);
                    route.request = Some(info);
                    break;
                }
            }
        }
    }

    for pattern in &config.responses {
        if ResponseMatcher::matches(pattern, &match_ctx) {
            if let Some(info) = ResponseMatcher::extract(pattern, &match_ctx) {
                if !info.body_type.is_empty() {
                    route.note_used_type(&info.body_type);
                    route.responses.insert(info.status_code.to_string(), info);
                }
            }
        }
    }

    for pattern in &config.params {
        if ParamMatcher::matches(pattern, &match_ctx) {
            if let Some(param) = ParamMatcher::extract(pattern, &match_ctx) {
                route.params.push(param);
            }
        }
    }

    for child in node.children().to_vec() {
        if !visited.contains(&child) {
            collect_children(tree, &child, ctx, tracer, config, method, visited, route);
        }
    }
}

fn node_passes_filters(match_ctx: &MatchCtx, config: &ApiSpecConfig) -> bool {
    let (caller_name, caller_pkg, _) = match_ctx.ctx.caller_info(match_ctx.node.edge());
    let (_, callee_pkg, _) = match_ctx.ctx.callee_info(match_ctx.node.edge());
    filter::passes(&config.filters, "functions", &caller_name)
        && filter::passes(&config.filters, "packages", &caller_pkg)
        && filter::passes(&config.filters, "packages", &callee_pkg)
}
