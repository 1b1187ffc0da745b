#![deny(missing_docs)]

//! # Override Applier
//!
//! Post-processes a [`RouteInfo`] with manual per-function overrides
//! configured in `APISpecConfig.overrides`. Applied once, after child
//! extraction has populated request/response/param data but before the
//! route is pushed into the Extractor's accumulator.

use crate::patterns::Override;
use crate::route_info::RouteInfo;

/// Applies the first override (in configuration order) whose
/// `function_name` equals `route.function`, if any.
pub fn apply_overrides(route: &mut RouteInfo, overrides: &[Override]) {
    let Some(over) = overrides.iter().find(|o| o.function_name == route.function) else { return };

    if !over.summary.is_empty() {
        route.summary = over.summary.clone();
    }

    if over.response_status != 0 {
        if let Some(resp) = route.responses.get_mut(&over.response_status.to_string()) {
            resp.status_code = over.response_status;
        }
    }

    if !over.response_type.is_empty() {
        let stripped = strip_one_prefix(&over.response_type);
        for resp in route.responses.values_mut() {
            resp.body_type = stripped.clone();
        }
    }

    if !over.tags.is_empty() {
        route.tags = over.tags.clone();
    }
}

/// Strips one leading `*`, `&`, or `[]` from `ty`.
fn strip_one_prefix(ty: &str) -> String {
    if let Some(rest) = ty.strip_prefix("[]") {
        rest.to_string()
    } else if let Some(rest) = ty.strip_prefix('*').or_else(|| ty.strip_prefix('&')) {
        rest.to_string()
    } else {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_info::ResponseInfo;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::collections::HashSet;

    fn base_route() -> RouteInfo {
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            ResponseInfo { status_code: 200, content_type: "application/json".into(), body_type: "app-->User".into(), schema: json!({}) },
        );
        RouteInfo {
            path: "/users".into(),
            method: "GET".into(),
            handler: "listUsers".into(),
            function: "listUsers".into(),
            package: "app".into(),
            file: String::new(),
            summary: String::new(),
            tags: vec![],
            request: None,
            responses,
            params: vec![],
            used_types: HashSet::new(),
            group_prefix: String::new(),
        }
    }

    #[test]
    fn no_matching_override_leaves_route_unchanged() {
        let mut route = base_route();
        let before = route.clone();
        apply_overrides(&mut route, &[Override { function_name: "other".into(), ..Default::default() }]);
        assert_eq!(route, before);
    }

    #[test]
    fn overwrites_summary_and_tags() {
        let mut route = base_route();
        apply_overrides(
            &mut route,
            &[Override {
                function_name: "listUsers".into(),
                summary: "Lists users".into(),
                tags: vec!["users".into()],
                ..Default::default()
            }],
        );
        assert_eq!(route.summary, "Lists users");
        assert_eq!(route.tags, vec!["users".to_string()]);
    }

    #[test]
    fn overwrites_every_response_body_type_stripped() {
        let mut route = base_route();
        apply_overrides(
            &mut route,
            &[Override { function_name: "listUsers".into(), response_type: "*app-->Admin".into(), ..Default::default() }],
        );
        assert_eq!(route.responses["200"].body_type, "app-->Admin");
    }

    #[test]
    fn empty_response_type_does_not_touch_bodies() {
        let mut route = base_route();
        apply_overrides(&mut route, &[Override { function_name: "listUsers".into(), ..Default::default() }]);
        assert_eq!(route.responses["200"].body_type, "app-->User");
    }
}
