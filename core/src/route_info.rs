#![deny(missing_docs)]

//! # Route Info
//!
//! The extracted, in-memory record for one HTTP operation, and the
//! transient mount-context record carried only across recursion. These
//! are the Extractor's output shape; the Assembler consumes them
//! directly and the Type Schema Builder consumes their `used_types`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Part of the URL path template.
    Path,
    /// A query-string parameter.
    Query,
    /// An HTTP header.
    Header,
    /// A cookie.
    Cookie,
    /// A form field (request body, not a true OpenAPI `in`; carried for
    /// bookkeeping and folded into the request body on assembly).
    Form,
}

impl ParamSource {
    /// The OpenAPI `in` value, or `None` for `Form` (which has no OpenAPI
    /// parameter-location equivalent).
    pub fn as_openapi_in(&self) -> Option<&'static str> {
        match self {
            ParamSource::Path => Some("path"),
            ParamSource::Query => Some("query"),
            ParamSource::Header => Some("header"),
            ParamSource::Cookie => Some("cookie"),
            ParamSource::Form => None,
        }
    }
}

/// One extracted request/response/path/query/header/cookie parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamInfo {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    #[serde(rename = "in")]
    pub location: ParamSource,
    /// Whether the parameter is required (always `true` for `Path`).
    pub required: bool,
    /// The parameter's schema.
    pub schema: Value,
    /// Vendor extensions attached to this parameter (e.g. `x-warning`).
    #[serde(default)]
    pub extensions: IndexMap<String, Value>,
}

/// A request body: content type, resolved type key, and its schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestInfo {
    /// The `Content-Type` this body is sent as.
    pub content_type: String,
    /// The resolved type key of the body.
    pub body_type: String,
    /// The body's schema.
    pub schema: Value,
}

/// One response entry, keyed in `RouteInfo.responses` by its decimal
/// status-code string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseInfo {
    /// The numeric status code (duplicated from the map key for
    /// convenience).
    pub status_code: u16,
    /// The `Content-Type` of this response.
    pub content_type: String,
    /// The resolved type key of the response body.
    pub body_type: String,
    /// The response body's schema.
    pub schema: Value,
}

/// The extracted record for one HTTP operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteInfo {
    /// The OpenAPI-style path template (`:name` not yet converted).
    pub path: String,
    /// The HTTP method, upper-cased (`GET`, `POST`, ...).
    pub method: String,
    /// The handler's simple name.
    pub handler: String,
    /// The declaring function's name (used for deduplication).
    pub function: String,
    /// The declaring function's package.
    pub package: String,
    /// The declaring file path, when known.
    #[serde(default)]
    pub file: String,
    /// A short human summary, set only by overrides.
    #[serde(default)]
    pub summary: String,
    /// Tags this operation carries (mount path prefixes, by default).
    #[serde(default)]
    pub tags: Vec<String>,
    /// The request body, if any was matched.
    #[serde(default)]
    pub request: Option<RequestInfo>,
    /// Responses, keyed by decimal status-code string.
    #[serde(default)]
    pub responses: IndexMap<String, ResponseInfo>,
    /// Extracted parameters, in discovery order.
    #[serde(default)]
    pub params: Vec<ParamInfo>,
    /// Type keys referenced by this route, shared with the schema
    /// builder's accumulator.
    #[serde(default)]
    pub used_types: HashSet<String>,
    /// The mount prefix in effect when this route was emitted.
    #[serde(default)]
    pub group_prefix: String,
}

impl RouteInfo {
    /// A route is valid iff it has a non-empty path and handler.
    pub fn is_valid(&self) -> bool {
        !self.path.is_empty() && !self.handler.is_empty()
    }

    /// Records that `ty` was referenced, skipping primitive/empty keys.
    pub fn note_used_type(&mut self, ty: &str) {
        if !ty.is_empty() && !crate::schema_mapper::is_primitive_or_wrapped(ty) {
            self.used_types.insert(ty.to_string());
        }
    }
}

/// Transient mount-scope record, carried only across recursion.
#[derive(Debug, Clone, Default)]
pub struct MountInfo {
    /// Textual form of the matched mount pattern's call (for debugging).
    pub pattern: String,
    /// The extracted mount path segment.
    pub path: String,
    /// The textual form of the router argument (identifier/selector/call).
    pub router_arg: String,
    /// The resolved origin of `router_arg`, when it was traced.
    pub assignment: Option<String>,
}

/// Joins a mount path with a new segment: `/a` + `/b` => `/a/b`; an
/// empty left side yields the right side unmodified; an empty right
/// side yields `left` with a trailing `/`. A new segment equal to the
/// current tail is suppressed (`/users` + `/users` => `/users`).
pub fn join_mount_path(left: &str, right: &str) -> String {
    if left.is_empty() {
        return right.to_string();
    }
    if right.is_empty() {
        return if left.ends_with('/') { left.to_string() } else { format!("{left}/") };
    }
    let left_trimmed = left.trim_end_matches('/');
    let right_trimmed = right.trim_start_matches('/');
    if let Some(tail) = left_trimmed.rsplit('/').next() {
        if tail == right_trimmed {
            return left_trimmed.to_string();
        }
    }
    format!("{left_trimmed}/{right_trimmed}")
}
