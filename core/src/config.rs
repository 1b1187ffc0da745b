#![deny(missing_docs)]

//! # Configuration loader
//!
//! Deserializes [`ApiSpecConfig`]/[`GeneratorConfig`] from a YAML or JSON
//! document, resolves a named built-in preset, and overlays a user
//! document's fields onto a preset field-by-field rather than replacing
//! it outright — so a user config that adds one override keeps every
//! built-in pattern instead of starting from nothing.

use crate::error::{AppError, AppResult};
use crate::patterns::ApiSpecConfig;
use crate::presets;
use serde_json::Value;

/// Parses `text` as YAML (a superset of JSON, so this also accepts
/// plain JSON documents) into an [`ApiSpecConfig`].
pub fn parse_api_spec_config(text: &str) -> AppResult<ApiSpecConfig> {
    serde_yaml::from_str(text).map_err(AppError::from)
}

/// Loads the named built-in preset, merges `overlay_text` (if any) on
/// top of it field-by-field, and returns the resulting configuration.
/// With no preset name and no overlay, returns the zero-value config
/// (every field empty, matching a bare `net/http` scan with no patterns
/// configured).
pub fn load(framework: Option<&str>, overlay_text: Option<&str>) -> AppResult<ApiSpecConfig> {
    let base = match framework {
        Some(name) => presets::by_name(name).ok_or_else(|| AppError::Config(format!("unknown framework preset: {name}")))?,
        None => ApiSpecConfig::default(),
    };
    match overlay_text {
        Some(text) => {
            let overlay = parse_api_spec_config(text)?;
            Ok(merge_over_preset(base, overlay))
        }
        None => Ok(base),
    }
}

/// Overlays `overlay`'s fields onto `preset`: list-valued fields
/// (routes, mounts, requests, responses, params, type mappings,
/// external types, overrides) are appended, not replaced; `filters`
/// entries are merged key-by-key, the overlay winning on a collision;
/// `openapi` is a shallow JSON-object merge, overlay winning per key;
/// `defaults` is taken from the overlay only when it differs from the
/// struct's own zero value (i.e. the user actually set something).
pub fn merge_over_preset(mut preset: ApiSpecConfig, overlay: ApiSpecConfig) -> ApiSpecConfig {
    preset.routes.extend(overlay.routes);
    preset.mounts.extend(overlay.mounts);
    preset.requests.extend(overlay.requests);
    preset.responses.extend(overlay.responses);
    preset.params.extend(overlay.params);
    preset.type_mapping.extend(overlay.type_mapping);
    preset.external_types.extend(overlay.external_types);
    preset.overrides.extend(overlay.overrides);
    for (key, rule) in overlay.filters {
        preset.filters.insert(key, rule);
    }
    preset.openapi = merge_json(preset.openapi, overlay.openapi);
    if overlay.defaults != Default::default() {
        preset.defaults = overlay.defaults;
    }
    preset
}

/// Shallow top-level merge of two JSON values: when both are objects,
/// the overlay's keys win; any other combination prefers the overlay
/// when it is not `Value::Null`.
fn merge_json(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                base_map.insert(key, value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}
