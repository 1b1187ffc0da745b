#![deny(missing_docs)]

//! # Pattern Configuration & Regex Cache
//!
//! The framework-agnostic DSL: regex selectors over call/receiver/
//! function names, plus the extraction hints each of the five matcher
//! kinds needs. Patterns are plain, `serde`-deserializable data so they
//! can come from a YAML config document or a built-in preset literal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Selectors shared by every pattern kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selectors {
    /// Matches the callee's simple name (required for a pattern to be
    /// considered nontrivial).
    #[serde(default)]
    pub call_regex: Option<String>,
    /// Matches the caller's enclosing function name.
    #[serde(default)]
    pub function_name_regex: Option<String>,
    /// Exact match against `"<callee.pkg>.<callee.recvType>"`.
    #[serde(default)]
    pub recv_type: Option<String>,
    /// Regex match against the same `"<pkg>.<recvType>"` string.
    #[serde(default)]
    pub recv_type_regex: Option<String>,
}

impl Selectors {
    /// Priority contribution of this selector set: 10 if `call_regex` is
    /// set, 5 if `function_name_regex` is set, 3 if either receiver
    /// selector is set.
    pub fn priority(&self) -> u32 {
        let mut score = 0;
        if self.call_regex.is_some() {
            score += 10;
        }
        if self.function_name_regex.is_some() {
            score += 5;
        }
        if self.recv_type.is_some() || self.recv_type_regex.is_some() {
            score += 3;
        }
        score
    }

    /// Whether every configured selector matches the given strings.
    /// A pattern with no selectors at all never matches (selectors are
    /// required for a pattern to be "nontrivial").
    pub fn matches(&self, callee_name: &str, caller_func: &str, callee_pkg: &str, callee_recv: &str) -> bool {
        if self.call_regex.is_none()
            && self.function_name_regex.is_none()
            && self.recv_type.is_none()
            && self.recv_type_regex.is_none()
        {
            return false;
        }
        if let Some(re) = &self.call_regex {
            if !cached_is_match(re, callee_name) {
                return false;
            }
        }
        if let Some(re) = &self.function_name_regex {
            if !cached_is_match(re, caller_func) {
                return false;
            }
        }
        let recv_str = qualify_recv(callee_pkg, callee_recv);
        if let Some(exact) = &self.recv_type {
            if &recv_str != exact {
                return false;
            }
        }
        if let Some(re) = &self.recv_type_regex {
            if !cached_is_match(re, &recv_str) {
                return false;
            }
        }
        true
    }
}

/// `"<pkg>.<recvType>"`, omitting the dot if either side is empty.
pub fn qualify_recv(pkg: &str, recv: &str) -> String {
    match (pkg.is_empty(), recv.is_empty()) {
        (true, true) => String::new(),
        (true, false) => recv.to_string(),
        (false, true) => pkg.to_string(),
        (false, false) => format!("{pkg}.{recv}"),
    }
}

/// A route pattern: identifies a route-registration call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutePattern {
    /// Common selectors.
    #[serde(flatten)]
    pub selectors: Selectors,
    /// Argument index holding the path, as string text.
    #[serde(default = "neg_one")]
    pub path_arg_index: i32,
    /// Argument index holding the handler.
    #[serde(default = "neg_one")]
    pub handler_arg_index: i32,
    /// The method, when it can be read straight off the call name.
    #[serde(default)]
    pub method_from_call: bool,
    /// Configuration for deriving the method from the handler name.
    #[serde(default)]
    pub method_extraction: Option<MethodExtractionConfig>,
}

fn neg_one() -> i32 {
    -1
}

/// One entry of a [`MethodExtractionConfig`] mapping table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodMapping {
    /// Candidate substrings/prefixes to test against the handler name.
    pub patterns: Vec<String>,
    /// The HTTP method this mapping yields on a match.
    pub method: String,
    /// Higher priority mappings are tested first.
    #[serde(default)]
    pub priority: i32,
}

/// Configuration for the `methodFromHandler` extraction strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodExtractionConfig {
    /// Priority-sorted candidate mappings.
    #[serde(default)]
    pub mappings: Vec<MethodMapping>,
    /// Test each pattern as a prefix of the handler name.
    #[serde(default)]
    pub use_prefix: bool,
    /// Test each pattern as a substring of the handler name.
    #[serde(default)]
    pub use_contains: bool,
    /// Case-sensitive matching (default: case-insensitive).
    #[serde(default)]
    pub case_sensitive: bool,
    /// Method to use when no mapping matches.
    #[serde(default)]
    pub default_method: String,
    /// Accepted for config-compatibility; has no effect (see DESIGN.md —
    /// resolves the distilled spec's Open Question by defining this as a
    /// documented no-op).
    #[serde(default)]
    pub infer_from_context: bool,
}

impl MethodExtractionConfig {
    /// Derives a method from `handler_name` using the configured
    /// mapping table, falling back to `default_method`.
    pub fn method_for(&self, handler_name: &str) -> String {
        let mut sorted: Vec<&MethodMapping> = self.mappings.iter().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        let haystack = if self.case_sensitive { handler_name.to_string() } else { handler_name.to_lowercase() };
        for mapping in sorted {
            for pat in &mapping.patterns {
                let needle = if self.case_sensitive { pat.clone() } else { pat.to_lowercase() };
                let hit = if self.use_prefix {
                    haystack.starts_with(&needle)
                } else if self.use_contains {
                    haystack.contains(&needle)
                } else {
                    haystack == needle
                };
                if hit {
                    return mapping.method.clone();
                }
            }
        }
        self.default_method.clone()
    }
}

/// A mount pattern: identifies a URL-prefix / sub-router call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountPattern {
    /// Common selectors.
    #[serde(flatten)]
    pub selectors: Selectors,
    /// Always `true` for a configured mount pattern.
    #[serde(default)]
    pub is_mount: bool,
    /// Argument index holding the nested router.
    #[serde(default = "neg_one")]
    pub router_arg_index: i32,
    /// Argument index holding the mount path.
    #[serde(default = "neg_one")]
    pub path_arg_index: i32,
}

/// A request-body pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestPattern {
    /// Common selectors.
    #[serde(flatten)]
    pub selectors: Selectors,
    /// Argument index holding the request body type.
    #[serde(default = "neg_one")]
    pub type_arg_index: i32,
    /// The `Content-Type` this pattern implies.
    #[serde(default)]
    pub content_type: String,
    /// Fire even when the enclosing route's method is GET/HEAD/DELETE.
    #[serde(default)]
    pub allow_for_get_methods: bool,
    /// Strip one leading `*` from the resolved type.
    #[serde(default)]
    pub deref: bool,
}

/// A response pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponsePattern {
    /// Common selectors.
    #[serde(flatten)]
    pub selectors: Selectors,
    /// Argument index holding the status code.
    #[serde(default = "neg_one")]
    pub status_arg_index: i32,
    /// Whether the status should be read from `status_arg_index`.
    #[serde(default)]
    pub status_from_arg: bool,
    /// Fixed status code to use when not read from an argument.
    #[serde(default)]
    pub fixed_status: u16,
    /// Argument index holding the response body type.
    #[serde(default = "neg_one")]
    pub type_arg_index: i32,
    /// Whether the type should be read from `type_arg_index`.
    #[serde(default)]
    pub type_from_arg: bool,
    /// The `Content-Type` this pattern implies.
    #[serde(default)]
    pub content_type: String,
}

/// A parameter pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamPattern {
    /// Common selectors.
    #[serde(flatten)]
    pub selectors: Selectors,
    /// Argument index holding the parameter name.
    #[serde(default = "neg_one")]
    pub name_arg_index: i32,
    /// Where the parameter is located.
    #[serde(default)]
    pub param_in: String,
}

/// A manual per-function override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Override {
    /// The function this override applies to.
    pub function_name: String,
    /// Overwrites the route's summary, if non-empty.
    #[serde(default)]
    pub summary: String,
    /// Retags the response at this status code, if non-zero and a
    /// response for that code exists.
    #[serde(default)]
    pub response_status: u16,
    /// Overwrites every response's body type, if non-empty (after
    /// stripping one leading `*`, `&`, or `[]`).
    #[serde(default)]
    pub response_type: String,
    /// Overwrites the route's tags, if non-empty.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A user-supplied schema override for an exact Go type name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeMapping {
    /// The exact Go type name this overrides.
    pub go_type: String,
    /// The schema to substitute.
    pub schema: serde_json::Value,
}

/// A user-registered schema for a type outside the scanned packages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalType {
    /// The un-escaped type name this registers a schema for.
    pub name: String,
    /// The schema to emit.
    pub schema: serde_json::Value,
}

/// Defaults applied when a route has no extracted response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Defaults {
    /// Status code of the synthesized default response.
    #[serde(default = "default_response_status")]
    pub response_status: u16,
    /// Content-Type of the synthesized default response.
    #[serde(default = "default_content_type")]
    pub response_content_type: String,
}

fn default_response_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "application/json".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults { response_status: default_response_status(), response_content_type: default_content_type() }
    }
}

/// Gitignore-style include/exclude pattern list for one category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncludeExclude {
    /// Include patterns; empty means "include everything".
    #[serde(default)]
    pub include: Vec<String>,
    /// Exclude patterns; exclude always wins over include.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// The full, framework-describing configuration consumed by the
/// pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiSpecConfig {
    /// Route patterns, checked in configuration order on priority ties.
    #[serde(default)]
    pub routes: Vec<RoutePattern>,
    /// Mount patterns.
    #[serde(default)]
    pub mounts: Vec<MountPattern>,
    /// Request-body patterns.
    #[serde(default)]
    pub requests: Vec<RequestPattern>,
    /// Response patterns.
    #[serde(default)]
    pub responses: Vec<ResponsePattern>,
    /// Parameter patterns.
    #[serde(default)]
    pub params: Vec<ParamPattern>,
    /// User-supplied exact-match schema overrides.
    #[serde(default)]
    pub type_mapping: Vec<TypeMapping>,
    /// User-registered schemas for external types.
    #[serde(default)]
    pub external_types: Vec<ExternalType>,
    /// Manual per-function overrides.
    #[serde(default)]
    pub overrides: Vec<Override>,
    /// Include/exclude patterns, keyed by category (`files`, `packages`,
    /// `functions`, `types`).
    #[serde(default)]
    pub filters: HashMap<String, IncludeExclude>,
    /// OpenAPI root-level metadata (info, servers, security, tags,
    /// externalDocs, securitySchemes) as a raw JSON value, assembled
    /// verbatim by the Assembler.
    #[serde(default)]
    pub openapi: serde_json::Value,
    /// Defaults applied when no response was extracted.
    #[serde(default)]
    pub defaults: Defaults,
}

/// Top-level document/version metadata, independent of framework
/// patterns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// The `openapi:` version string to emit (e.g. `"3.0.3"`).
    #[serde(default = "default_openapi_version")]
    pub open_api_version: String,
    /// Fallback `info.title` when the config's `openapi.info.title` is empty.
    #[serde(default)]
    pub title: String,
    /// Fallback `info.version` when the config's `openapi.info.version` is empty.
    #[serde(default)]
    pub api_version: String,
}

fn default_openapi_version() -> String {
    "3.0.3".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig { open_api_version: default_openapi_version(), title: String::new(), api_version: String::new() }
    }
}

static REGEX_CACHE: OnceLock<RwLock<HashMap<String, Regex>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<String, Regex>> {
    REGEX_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Tests `haystack` against the compiled form of `pattern`, compiling
/// and memoizing it on first use. A pattern that fails to compile never
/// matches (this is not a hard failure, per the matcher contract).
pub fn cached_is_match(pattern: &str, haystack: &str) -> bool {
    if let Some(re) = cache().read().unwrap().get(pattern) {
        return re.is_match(haystack);
    }
    let mut guard = cache().write().unwrap();
    // Double-checked: another writer may have inserted it first.
    let re = guard.entry(pattern.to_string()).or_insert_with(|| {
        Regex::new(pattern).unwrap_or_else(|_| Regex::new("$^").expect("never-matching fallback is valid"))
    });
    re.is_match(haystack)
}
