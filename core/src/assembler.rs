#![deny(missing_docs)]

//! # OpenAPI Assembler
//!
//! Converts the Extractor's `Vec<RouteInfo>` plus the Type Schema
//! Builder's component schemas and the configuration's global metadata
//! into one complete OpenAPI 3.0.x document.

use crate::patterns::{ApiSpecConfig, GeneratorConfig};
use crate::route_info::RouteInfo;
use crate::schema_mapper::http_status_text;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Builds the full OpenAPI document.
pub fn assemble(routes: &[RouteInfo], schemas: IndexMap<String, Value>, config: &ApiSpecConfig, generator: &GeneratorConfig) -> Value {
    let mut paths: IndexMap<String, Value> = IndexMap::new();
    for route in routes {
        if !route.is_valid() {
            continue;
        }
        let path = convert_path(&route.path);
        let operation = build_operation(route, config);
        let Some(verb) = method_verb(&route.method) else { continue };
        let entry = paths.entry(path).or_insert_with(|| json!({}));
        entry.as_object_mut().expect("path item is always an object").insert(verb.to_string(), operation);
    }

    let mut doc = Map::new();
    doc.insert("openapi".to_string(), json!(generator.open_api_version));
    doc.insert("info".to_string(), build_info(config, generator));
    doc.insert("paths".to_string(), json!(paths));

    let mut components = Map::new();
    components.insert("schemas".to_string(), json!(schemas));
    if let Some(security_schemes) = config.openapi.get("securitySchemes").or_else(|| config.openapi.get("components").and_then(|c| c.get("securitySchemes"))) {
        components.insert("securitySchemes".to_string(), security_schemes.clone());
    }
    doc.insert("components".to_string(), Value::Object(components));

    for key in ["servers", "security", "tags", "externalDocs"] {
        if let Some(value) = config.openapi.get(key) {
            doc.insert(key.to_string(), value.clone());
        }
    }

    Value::Object(doc)
}

/// `info` assembled from configuration, falling back to `generator`'s
/// title/version when the configured document's own fields are empty.
fn build_info(config: &ApiSpecConfig, generator: &GeneratorConfig) -> Value {
    let configured = config.openapi.get("info").cloned().unwrap_or_else(|| json!({}));
    let mut info = configured.as_object().cloned().unwrap_or_default();

    let title_empty = info.get("title").and_then(Value::as_str).map(str::is_empty).unwrap_or(true);
    if title_empty {
        info.insert("title".to_string(), json!(generator.title));
    }
    let version_empty = info.get("version").and_then(Value::as_str).map(str::is_empty).unwrap_or(true);
    if version_empty {
        info.insert("version".to_string(), json!(generator.api_version));
    }
    Value::Object(info)
}

/// Converts `:name` path segments to `{name}`.
fn convert_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if is_valid_ident(name) => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Derives `operationId = "<package>.<Function>"`, collapsing a
/// `-->`-qualified function name's own package prefix when it repeats
/// the route's package.
fn operation_id(route: &RouteInfo) -> String {
    let bare_function = route.function.rsplit("-->").next().unwrap_or(&route.function);
    if route.package.is_empty() {
        bare_function.to_string()
    } else {
        format!("{}.{}", route.package, bare_function)
    }
}

fn build_operation(route: &RouteInfo, config: &ApiSpecConfig) -> Value {
    let mut op = Map::new();
    op.insert("operationId".to_string(), json!(operation_id(route)));
    if !route.summary.is_empty() {
        op.insert("summary".to_string(), json!(route.summary));
    }
    if !route.tags.is_empty() {
        op.insert("tags".to_string(), json!(route.tags));
    }

    if let Some(request) = &route.request {
        op.insert(
            "requestBody".to_string(),
            json!({
                "content": { request.content_type.clone(): { "schema": request.schema } }
            }),
        );
    }

    let params = build_parameters(route);
    if !params.is_empty() {
        op.insert("parameters".to_string(), json!(params));
    }

    op.insert("responses".to_string(), build_responses(route, config));
    Value::Object(op)
}

/// Deduplicates parameters by `(name, in)` and synthesizes any path
/// placeholder missing from the extracted parameter list.
fn build_parameters(route: &RouteInfo) -> Vec<Value> {
    let mut seen: Vec<(String, &'static str)> = Vec::new();
    let mut out: Vec<Value> = Vec::new();

    for param in &route.params {
        let Some(location) = param.location.as_openapi_in() else { continue };
        let key = (param.name.clone(), location);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        let mut entry = Map::new();
        entry.insert("name".to_string(), json!(param.name));
        entry.insert("in".to_string(), json!(location));
        entry.insert("required".to_string(), json!(param.required));
        entry.insert("schema".to_string(), param.schema.clone());
        for (ext_key, ext_value) in &param.extensions {
            entry.insert(ext_key.clone(), ext_value.clone());
        }
        out.push(Value::Object(entry));
    }

    for name in path_placeholders(&convert_path(&route.path)) {
        if seen.contains(&(name.clone(), "path")) {
            continue;
        }
        seen.push((name.clone(), "path"));
        out.push(json!({
            "name": name,
            "in": "path",
            "required": true,
            "schema": {"type": "string"},
            "x-warning": format!("{name} is present in the path but not found in the code."),
        }));
    }

    out
}

fn path_placeholders(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        out.push(after[..close].to_string());
        rest = &after[close + 1..];
    }
    out
}

/// Builds the `responses` object: the configured default when the route
/// recorded no responses (nil or empty, treated alike), otherwise every
/// recorded entry with a standard-phrase description.
fn build_responses(route: &RouteInfo, config: &ApiSpecConfig) -> Value {
    if route.responses.is_empty() {
        return json!({
            config.defaults.response_status.to_string(): {
                "description": "Success",
                "content": {
                    config.defaults.response_content_type.clone(): { "schema": {"type": "object"} }
                }
            }
        });
    }

    let mut responses = Map::new();
    for (status, response) in &route.responses {
        responses.insert(
            status.clone(),
            json!({
                "description": http_status_text(response.status_code),
                "content": {
                    response.content_type.clone(): { "schema": response.schema }
                }
            }),
        );
    }
    Value::Object(responses)
}

/// Maps an HTTP method name to its `PathItem` field, dropping anything
/// that isn't a recognized verb.
fn method_verb(method: &str) -> Option<&'static str> {
    Some(match method.to_uppercase().as_str() {
        "GET" => "get",
        "POST" => "post",
        "PUT" => "put",
        "DELETE" => "delete",
        "PATCH" => "patch",
        "OPTIONS" => "options",
        "HEAD" => "head",
        "TRACE" => "trace",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_info::{ParamInfo, ParamSource, ResponseInfo};
    use std::collections::HashSet;

    fn generator() -> GeneratorConfig {
        GeneratorConfig { open_api_version: "3.0.3".into(), title: "Fallback".into(), api_version: "0.0.0".into() }
    }

    fn route() -> RouteInfo {
        RouteInfo {
            path: "/users/:id".into(),
            method: "GET".into(),
            handler: "getUser".into(),
            function: "app-->getUser".into(),
            package: "app".into(),
            file: String::new(),
            summary: String::new(),
            tags: vec![],
            request: None,
            responses: IndexMap::new(),
            params: vec![],
            used_types: HashSet::new(),
            group_prefix: String::new(),
        }
    }

    #[test]
    fn converts_colon_segments_to_braces() {
        assert_eq!(convert_path("/users/:id/posts/:postId"), "/users/{id}/posts/{postId}");
    }

    #[test]
    fn invalid_identifier_segment_is_left_untouched() {
        assert_eq!(convert_path("/users/:1bad"), "/users/:1bad");
    }

    #[test]
    fn operation_id_joins_package_and_bare_function() {
        let r = route();
        assert_eq!(operation_id(&r), "app.getUser");
    }

    #[test]
    fn missing_responses_synthesize_configured_default() {
        let r = route();
        let config = ApiSpecConfig::default();
        let responses = build_responses(&r, &config);
        assert_eq!(responses["200"]["description"], json!("Success"));
    }

    #[test]
    fn empty_but_present_responses_also_synthesize_default() {
        let mut r = route();
        r.responses = IndexMap::new();
        let config = ApiSpecConfig::default();
        let responses = build_responses(&r, &config);
        assert!(responses.get("200").is_some());
    }

    #[test]
    fn recorded_response_uses_standard_status_text() {
        let mut r = route();
        r.responses.insert(
            "404".to_string(),
            ResponseInfo { status_code: 404, content_type: "application/json".into(), body_type: "string".into(), schema: json!({"type": "string"}) },
        );
        let config = ApiSpecConfig::default();
        let responses = build_responses(&r, &config);
        assert_eq!(responses["404"]["description"], json!("Not Found"));
    }

    #[test]
    fn missing_path_param_is_synthesized_with_warning() {
        let r = route();
        let params = build_parameters(&r);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], json!("id"));
        assert_eq!(params[0]["required"], json!(true));
        assert!(params[0]["x-warning"].as_str().unwrap().contains("not found in the code"));
    }

    #[test]
    fn extracted_path_param_suppresses_synthesis() {
        let mut r = route();
        r.params.push(ParamInfo { name: "id".into(), location: ParamSource::Path, required: true, schema: json!({"type": "string"}), extensions: IndexMap::new() });
        let params = build_parameters(&r);
        assert_eq!(params.len(), 1);
        assert!(params[0].get("x-warning").is_none());
    }

    #[test]
    fn duplicate_name_and_location_is_deduplicated() {
        let mut r = route();
        r.path = "/users".into();
        r.params.push(ParamInfo { name: "q".into(), location: ParamSource::Query, required: false, schema: json!({"type": "string"}), extensions: IndexMap::new() });
        r.params.push(ParamInfo { name: "q".into(), location: ParamSource::Query, required: false, schema: json!({"type": "string"}), extensions: IndexMap::new() });
        let params = build_parameters(&r);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn form_parameters_are_not_openapi_parameters() {
        let mut r = route();
        r.path = "/users".into();
        r.params.push(ParamInfo { name: "file".into(), location: ParamSource::Form, required: false, schema: json!({"type": "string"}), extensions: IndexMap::new() });
        assert!(build_parameters(&r).is_empty());
    }

    #[test]
    fn invalid_http_method_drops_the_route_silently() {
        let mut r = route();
        r.method = "CONNECT".into();
        let schemas = IndexMap::new();
        let config = ApiSpecConfig::default();
        let doc = assemble(&[r], schemas, &config, &generator());
        assert!(doc["paths"].as_object().unwrap().is_empty());
    }

    #[test]
    fn two_routes_sharing_a_path_place_both_verbs() {
        let mut get_route = route();
        get_route.path = "/users".into();
        let mut post_route = route();
        post_route.path = "/users".into();
        post_route.method = "POST".into();
        let schemas = IndexMap::new();
        let config = ApiSpecConfig::default();
        let doc = assemble(&[get_route, post_route], schemas, &config, &generator());
        let path_item = &doc["paths"]["/users"];
        assert!(path_item.get("get").is_some());
        assert!(path_item.get("post").is_some());
    }

    #[test]
    fn info_falls_back_to_generator_when_config_is_empty() {
        let config = ApiSpecConfig::default();
        let info = build_info(&config, &generator());
        assert_eq!(info["title"], json!("Fallback"));
        assert_eq!(info["version"], json!("0.0.0"));
    }

    #[test]
    fn info_prefers_configured_values_when_present() {
        let config = ApiSpecConfig { openapi: json!({"info": {"title": "Real API", "version": "1.2.3"}}), ..Default::default() };
        let info = build_info(&config, &generator());
        assert_eq!(info["title"], json!("Real API"));
        assert_eq!(info["version"], json!("1.2.3"));
    }
}
