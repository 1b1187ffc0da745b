#![deny(missing_docs)]

//! # Schema Mapper
//!
//! Pure mapping from primitive/composite type names to OpenAPI schemas,
//! plus the status-code and HTTP-method lexicons. Nothing here touches
//! metadata or the call graph; every function is a total, side-effect
//! free transform of its inputs.

use serde_json::{json, Map, Value};

/// HTTP methods recognized by substring search, in declaration (and
/// match-priority) order.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD"];

/// Whether `ty` names one of the fixed primitive type-key forms (bare
/// names; `*`/`[]`/`map[]` wrapping of purely primitive leaves is
/// recognized by [`is_primitive_or_wrapped`], not here).
pub fn is_primitive(ty: &str) -> bool {
    matches!(
        ty,
        "string"
            | "int" | "int8" | "int16" | "int32" | "int64"
            | "uint" | "uint8" | "uint16" | "uint32" | "uint64"
            | "byte" | "rune"
            | "float32" | "float64"
            | "bool"
            | "error"
            | "interface{}"
            | "struct{}"
            | "any"
            | "complex64" | "complex128"
            | "time.Time"
            | "nil"
    )
}

/// Like [`is_primitive`] but also true for `*T`, `[]T`, `map[K]V` whose
/// leaf type is itself primitive.
pub fn is_primitive_or_wrapped(ty: &str) -> bool {
    if is_primitive(ty) {
        return true;
    }
    if let Some(rest) = ty.strip_prefix('*') {
        return is_primitive_or_wrapped(rest);
    }
    if let Some(rest) = ty.strip_prefix("[]") {
        return is_primitive_or_wrapped(rest);
    }
    if let Some(rest) = ty.strip_prefix("map[") {
        if let Some(close) = rest.find(']') {
            return is_primitive_or_wrapped(&rest[close + 1..]);
        }
    }
    false
}

/// Escapes a type key for use as a `components.schemas` map key / `$ref`
/// suffix: `/` -> `_`, `-->` -> `.`, ` ` -> `-`, `[` -> `_`, `]` -> ``,
/// `,` -> `-`.
pub fn escape_type_key(ty: &str) -> String {
    ty.replace("-->", ".")
        .replace('/', "_")
        .replace(' ', "-")
        .replace('[', "_")
        .replace(']', "")
        .replace(',', "-")
}

/// Builds a `$ref` schema pointing at `components/schemas/<escaped ty>`.
pub fn ref_schema(ty: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", escape_type_key(ty)) })
}

/// Lowers a type key to its OpenAPI schema, recursing for wrapper forms.
/// Custom (non-primitive, non-wrapped) names become a `$ref`.
pub fn map_type_to_schema(ty: &str) -> Value {
    match ty {
        "string" => json!({"type": "string"}),
        "int" | "int8" | "int16" | "int32" | "int64" => json!({"type": "integer"}),
        "uint" | "uint8" | "uint16" | "uint32" | "uint64" | "byte" => {
            json!({"type": "integer", "minimum": 0})
        }
        "rune" => json!({"type": "integer"}),
        "float32" | "float64" => json!({"type": "number"}),
        "bool" => json!({"type": "boolean"}),
        "time.Time" => json!({"type": "string", "format": "date-time"}),
        "error" | "interface{}" | "any" | "struct{}" | "nil" => json!({}),
        "[]byte" => json!({"type": "string", "format": "byte"}),
        _ if ty.starts_with('*') => map_type_to_schema(&ty[1..]),
        _ if ty.starts_with("[]") => {
            let elem = &ty[2..];
            let items = if is_primitive(elem) { map_type_to_schema(elem) } else { ref_schema(elem) };
            json!({"type": "array", "items": items})
        }
        _ if ty.starts_with("map[") => map_schema_from(ty),
        "" => json!({}),
        _ => ref_schema(ty),
    }
}

fn map_schema_from(ty: &str) -> Value {
    let rest = &ty["map[".len()..];
    let Some(close) = rest.find(']') else {
        return json!({"type": "object"});
    };
    let key = &rest[..close];
    let value = &rest[close + 1..];
    if key != "string" {
        return json!({"type": "object"});
    }
    let value_schema = if is_primitive(value) { map_type_to_schema(value) } else { ref_schema(value) };
    json!({"type": "object", "additionalProperties": value_schema})
}

/// Named HTTP status constants recognized with or without a leading
/// `net/http`-style package prefix (`http.StatusOK`, `StatusOK`).
fn status_constant(name: &str) -> Option<u16> {
    let short = name.rsplit('.').next().unwrap_or(name);
    Some(match short {
        "StatusOK" => 200,
        "StatusCreated" => 201,
        "StatusAccepted" => 202,
        "StatusNoContent" => 204,
        "StatusMovedPermanently" => 301,
        "StatusFound" => 302,
        "StatusNotModified" => 304,
        "StatusBadRequest" => 400,
        "StatusUnauthorized" => 401,
        "StatusForbidden" => 403,
        "StatusNotFound" => 404,
        "StatusMethodNotAllowed" => 405,
        "StatusConflict" => 409,
        "StatusUnprocessableEntity" => 422,
        "StatusTooManyRequests" => 429,
        "StatusInternalServerError" => 500,
        "StatusNotImplemented" => 501,
        "StatusBadGateway" => 502,
        "StatusServiceUnavailable" => 503,
        _ => return None,
    })
}

/// Parses a status code from quoted/unquoted decimal text or a named
/// constant. Returns `(code, ok)`.
pub fn parse_status_code(raw: &str) -> (u16, bool) {
    let trimmed = raw.trim().trim_matches('"');
    if let Ok(code) = trimmed.parse::<u16>() {
        return (code, true);
    }
    match status_constant(trimmed) {
        Some(code) => (code, true),
        None => (0, false),
    }
}

/// Case-insensitive first-match search for an HTTP method substring in
/// `name`, in [`HTTP_METHODS`] declaration order.
pub fn method_from_name(name: &str) -> Option<&'static str> {
    let upper = name.to_uppercase();
    HTTP_METHODS.iter().copied().find(|m| upper.contains(*m))
}

/// Maps a decimal HTTP status code to its standard reason phrase, used
/// as a response object's `description` when none is configured.
pub fn http_status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Response",
    }
}

/// Classifies a literal argument's printed form into a schema, to avoid
/// synthesizing a `$ref` for e.g. a bare string/bool/number response.
pub fn literal_schema(text: &str) -> Value {
    let t = text.trim();
    if t == "nil" {
        return json!({});
    }
    if t == "true" || t == "false" {
        return json!({"type": "boolean"});
    }
    if t.contains('.') && t.parse::<f64>().is_ok() {
        return json!({"type": "number", "format": "float64"});
    }
    if t.parse::<i64>().is_ok() {
        return json!({"type": "integer"});
    }
    json!({"type": "string"})
}

/// Classifies a literal's raw, still-quoted pooled text into the Go type
/// name it stands for: `"hello"`→`string`, `42`→`int`, `3.14`→`float64`,
/// `true`/`false`→`bool`, `nil`→`interface{}`.
pub fn literal_type_name(raw: &str) -> &'static str {
    let t = raw.trim();
    if t == "nil" {
        "interface{}"
    } else if t == "true" || t == "false" {
        "bool"
    } else if t.starts_with('"') && t.ends_with('"') {
        "string"
    } else if t.contains('.') && t.parse::<f64>().is_ok() {
        "float64"
    } else if t.parse::<i64>().is_ok() {
        "int"
    } else {
        "string"
    }
}

/// Builds an empty, mutable schema object map — convenience for callers
/// assembling a schema field-by-field before wrapping it in `Value`.
pub fn object_schema() -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("type".to_string(), json!("object"));
    m
}
