#![deny(missing_docs)]

//! # Framework Presets
//!
//! Built-in [`ApiSpecConfig`] literals for the frameworks this pipeline
//! ships idiomatic patterns for out of the box. Each constructor is pure
//! data — no regex is compiled until the Extractor actually runs a
//! pattern against a candidate node, via the shared regex cache.

use crate::patterns::{ApiSpecConfig, MountPattern, RoutePattern, Selectors};

fn route(call_regex: &str, recv_type_regex: &str, path_arg_index: i32, handler_arg_index: i32) -> RoutePattern {
    RoutePattern {
        selectors: Selectors { call_regex: Some(call_regex.into()), function_name_regex: None, recv_type: None, recv_type_regex: Some(recv_type_regex.into()) },
        path_arg_index,
        handler_arg_index,
        method_from_call: true,
        method_extraction: None,
    }
}

fn mount(call_regex: &str, recv_type_regex: &str, path_arg_index: i32, router_arg_index: i32) -> MountPattern {
    MountPattern {
        selectors: Selectors { call_regex: Some(call_regex.into()), function_name_regex: None, recv_type: None, recv_type_regex: Some(recv_type_regex.into()) },
        is_mount: true,
        router_arg_index,
        path_arg_index,
    }
}

/// `github.com/go-chi/chi`: `Get`/`Post`/.../`Route`/`Mount` methods on
/// `*chi.Mux`.
pub fn chi() -> ApiSpecConfig {
    ApiSpecConfig {
        routes: vec![route("^(Get|Post|Put|Delete|Patch|Head|Options|Connect|Trace)$", r"chi\.Mux$", 0, 1)],
        mounts: vec![
            mount("^Mount$", r"chi\.Mux$", 0, 1),
            mount("^Route$", r"chi\.Mux$", 0, 1),
        ],
        ..Default::default()
    }
}

/// `github.com/labstack/echo`: `GET`/`POST`/.../`Group` on `*echo.Echo`
/// and `*echo.Group`.
pub fn echo() -> ApiSpecConfig {
    ApiSpecConfig {
        routes: vec![route("^(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS|CONNECT|TRACE)$", r"echo\.(Echo|Group)$", 0, 1)],
        mounts: vec![mount("^Group$", r"echo\.(Echo|Group)$", 0, -1)],
        ..Default::default()
    }
}

/// `github.com/gofiber/fiber`: `Get`/`Post`/.../`Group` on `*fiber.App`
/// and `fiber.Router`.
pub fn fiber() -> ApiSpecConfig {
    ApiSpecConfig {
        routes: vec![route("^(Get|Post|Put|Delete|Patch|Head|Options|Connect|Trace)$", r"fiber\.(App|Router)$", 0, 1)],
        mounts: vec![mount("^Group$", r"fiber\.(App|Router)$", 0, -1)],
        ..Default::default()
    }
}

/// `github.com/gin-gonic/gin`: `GET`/`POST`/.../`Group` on `*gin.Engine`
/// and `*gin.RouterGroup`.
pub fn gin() -> ApiSpecConfig {
    ApiSpecConfig {
        routes: vec![route("^(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)$", r"gin\.(Engine|RouterGroup)$", 0, 1)],
        mounts: vec![mount("^Group$", r"gin\.(Engine|RouterGroup)$", 0, -1)],
        ..Default::default()
    }
}

/// `github.com/gorilla/mux`: `HandleFunc` on `*mux.Router`, method
/// narrowed by a trailing `.Methods(...)` call recorded as a second
/// edge against the same path (outside this pipeline's scope — the
/// bare preset treats every `HandleFunc` as `GET` via
/// [`crate::patterns::Defaults`] unless the caller supplies a
/// `methodExtraction` override).
pub fn mux() -> ApiSpecConfig {
    ApiSpecConfig {
        routes: vec![RoutePattern {
            selectors: Selectors { call_regex: Some("^HandleFunc$".into()), function_name_regex: None, recv_type: None, recv_type_regex: Some(r"mux\.Router$".into()) },
            path_arg_index: 0,
            handler_arg_index: 1,
            method_from_call: false,
            method_extraction: None,
        }],
        mounts: vec![mount("^PathPrefix$", r"mux\.Router$", 0, -1)],
        ..Default::default()
    }
}

/// Generic `net/http`: `HandleFunc` on `*http.ServeMux`, no sub-router
/// mounting idiom.
pub fn net_http() -> ApiSpecConfig {
    ApiSpecConfig {
        routes: vec![RoutePattern {
            selectors: Selectors { call_regex: Some("^HandleFunc$".into()), function_name_regex: None, recv_type: None, recv_type_regex: Some(r"http\.ServeMux$".into()) },
            path_arg_index: 0,
            handler_arg_index: 1,
            method_from_call: false,
            method_extraction: None,
        }],
        ..Default::default()
    }
}

/// Looks up a built-in preset by its configuration key
/// (`chi`/`echo`/`fiber`/`gin`/`mux`/`net/http`), case-insensitively.
pub fn by_name(name: &str) -> Option<ApiSpecConfig> {
    Some(match name.to_lowercase().as_str() {
        "chi" => chi(),
        "echo" => echo(),
        "fiber" => fiber(),
        "gin" | "gin-gonic" => gin(),
        "mux" | "gorilla" | "gorilla-mux" => mux(),
        "net/http" | "nethttp" | "http" | "generic" => net_http(),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_named_preset_resolves() {
        for name in ["chi", "echo", "fiber", "gin", "mux", "net/http"] {
            assert!(by_name(name).is_some(), "{name} should resolve");
        }
    }

    #[test]
    fn unknown_preset_name_is_none() {
        assert!(by_name("unknown-framework").is_none());
    }

    #[test]
    fn preset_lookup_is_case_insensitive() {
        assert!(by_name("GIN").is_some());
    }

    #[test]
    fn gin_preset_has_one_route_and_one_mount_pattern() {
        let config = gin();
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.mounts.len(), 1);
    }

    #[test]
    fn chi_preset_recognizes_both_mount_and_route_style_subrouters() {
        let config = chi();
        assert_eq!(config.mounts.len(), 2);
    }
}
