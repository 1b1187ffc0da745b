#![deny(missing_docs)]

//! # Type Schema Builder
//!
//! From the union of type keys referenced by every route, produces the
//! `components.schemas` map: cycle-safe `$ref` sharing, struct/interface/
//! alias lowering, validation-tag constraint propagation, JSON-name
//! remapping, and enum inference from grouped constants.

use crate::callgraph::{FileTable, Metadata, TypeDef, TypeKind, VariableInfo};
use crate::patterns::ApiSpecConfig;
use crate::resolver::split_type_parameters;
use crate::schema_mapper::{self, escape_type_key};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Builds `components.schemas` from the set of type keys referenced by
/// all extracted routes.
pub fn build_schemas(used_types: &HashSet<String>, meta: &Metadata, config: &ApiSpecConfig) -> IndexMap<String, Value> {
    let mut schemas = IndexMap::new();
    let mut visiting: HashSet<String> = HashSet::new();
    let mut sorted: Vec<&String> = used_types.iter().collect();
    sorted.sort();
    for ty in sorted {
        resolve_type(ty, meta, config, &mut visiting, &mut schemas);
    }
    schemas
}

/// Whether `key` is eligible to be shared via `$ref` rather than inlined:
/// not a primitive, not a slice/map wrapper, and not ending in `_nested`.
fn ref_eligible(key: &str) -> bool {
    !schema_mapper::is_primitive_or_wrapped(key) && !key.ends_with("_nested") && !key.starts_with("[]") && !key.starts_with("map[")
}

fn resolve_type(ty: &str, meta: &Metadata, config: &ApiSpecConfig, visiting: &mut HashSet<String>, schemas: &mut IndexMap<String, Value>) {
    if !ref_eligible(ty) {
        return;
    }
    let escaped = escape_type_key(ty);
    if visiting.contains(ty) {
        return;
    }
    visiting.insert(ty.to_string());

    if let Some(ext) = config.external_types.iter().find(|e| e.name == ty) {
        schemas.insert(escape_type_key(&ext.name), ext.schema.clone());
        return;
    }
    if let Some(tm) = config.type_mapping.iter().find(|t| t.go_type == ty) {
        schemas.insert(escaped, tm.schema.clone());
        return;
    }

    let (pkg, name, generics) = split_type_key(ty);
    let Some(pkg) = pkg else {
        schemas.insert(escaped, json!({"type": "object"}));
        return;
    };
    let Some(type_def) = meta.find_type(&pkg, &name) else {
        // Unknown type: a dangling $ref is deliberately left for the
        // consumer to resolve (§7 "schema lowering for unknown type").
        return;
    };

    let substitution = build_substitution(&generics);
    if !substitution.is_empty() {
        for concrete in substitution.values() {
            if schema_mapper::is_primitive_or_wrapped(concrete) {
                schemas.entry(format!("{pkg}.{name}-{concrete}")).or_insert(Value::Null);
            } else {
                resolve_type(concrete, meta, config, visiting, schemas);
                schemas.entry(format!("{pkg}.{name}_{}", escape_type_key(concrete))).or_insert_with(|| schema_mapper::ref_schema(concrete));
            }
        }
    }

    let schema = lower_type(&pkg, &name, type_def, &substitution, meta, config, visiting, schemas);
    schemas.insert(escaped, schema);
}

/// Splits a type key into `(pkg, name, generic args)`. Handles both the
/// qualified `-->`-separated generic form and the bracket form tolerated
/// on input.
fn split_type_key(ty: &str) -> (Option<String>, String, Vec<String>) {
    if let Some(open) = ty.find('[') {
        if ty.ends_with(']') {
            let base = &ty[..open];
            let inner = &ty[open + 1..ty.len() - 1];
            let params = split_type_parameters(inner);
            let (pkg, name) = split_base(base);
            return (pkg, name, params);
        }
    }
    let parts: Vec<&str> = ty.split("-->").collect();
    match parts.len() {
        0 | 1 => (None, ty.to_string(), vec![]),
        2 => (Some(parts[0].to_string()), parts[1].to_string(), vec![]),
        _ => (Some(parts[0].to_string()), parts[1].to_string(), parts[2..].iter().map(|s| s.to_string()).collect()),
    }
}

fn split_base(base: &str) -> (Option<String>, String) {
    match base.rsplit_once("-->") {
        Some((pkg, name)) => (Some(pkg.to_string()), name.to_string()),
        None => (None, base.to_string()),
    }
}

/// Builds the `{T1 -> concrete, T2 -> concrete, ...}` substitution map
/// for a generic type's declared fields. Struct field types that name a
/// bare generic placeholder use the same positional `T1`/`T2`/...
/// convention the Type Resolver's call-site generics use, since the
/// metadata model does not carry the source's own parameter names.
fn build_substitution(generics: &[String]) -> IndexMap<String, String> {
    generics.iter().enumerate().map(|(i, g)| (format!("T{}", i + 1), g.clone())).collect()
}

#[allow(clippy::too_many_arguments)]
fn lower_type(
    pkg: &str,
    name: &str,
    type_def: &TypeDef,
    substitution: &IndexMap<String, String>,
    meta: &Metadata,
    config: &ApiSpecConfig,
    visiting: &mut HashSet<String>,
    schemas: &mut IndexMap<String, Value>,
) -> Value {
    match &type_def.kind {
        TypeKind::Struct { fields } => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for field in fields {
                let tag = parse_struct_tag(&field.tag);
                if tag.skip {
                    continue;
                }
                let json_name = tag.json_name.clone().unwrap_or_else(|| field.name.clone());
                let field_type = substitution.get(field.type_.as_str()).cloned().unwrap_or_else(|| field.type_.clone());

                let mut field_schema = if schema_mapper::is_primitive_or_wrapped(&field_type) {
                    schema_mapper::map_type_to_schema(&field_type)
                } else if ref_eligible(&field_type) {
                    resolve_type(&field_type, meta, config, visiting, schemas);
                    schema_mapper::ref_schema(&field_type)
                } else {
                    schema_mapper::map_type_to_schema(&field_type)
                };

                apply_constraints(&mut field_schema, &tag);

                if tag.required {
                    required.push(json_name.clone());
                }

                if !field_type_is_slice_or_map(&field_type) && schema_mapper::is_primitive_or_wrapped(&field_type) {
                    if let Some(enum_values) = tag.enum_values.clone().or_else(|| detect_enum(pkg, &field_type, meta)) {
                        attach_enum(&mut field_schema, enum_values);
                    }
                }

                properties.insert(json_name, field_schema);
            }
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!("object"));
            obj.insert("properties".to_string(), Value::Object(properties));
            if !required.is_empty() {
                obj.insert("required".to_string(), json!(required));
            }
            Value::Object(obj)
        }
        TypeKind::Interface => json!({"type": "object"}),
        TypeKind::Alias { target } => {
            let mut schema = if schema_mapper::is_primitive_or_wrapped(target) {
                schema_mapper::map_type_to_schema(target)
            } else if ref_eligible(target) {
                resolve_type(target, meta, config, visiting, schemas);
                schema_mapper::ref_schema(target)
            } else {
                schema_mapper::map_type_to_schema(target)
            };
            if schema_mapper::is_primitive(target) {
                let full_key = format!("{pkg}-->{name}");
                if let Some(enum_values) = detect_enum(pkg, &full_key, meta).or_else(|| detect_enum(pkg, name, meta)) {
                    attach_enum(&mut schema, enum_values);
                }
            }
            schema
        }
        TypeKind::Other => json!({"type": "object"}),
    }
}

fn field_type_is_slice_or_map(ty: &str) -> bool {
    ty.starts_with("[]") || ty.starts_with("map[")
}

/// Parsed rules from one field's struct tag.
#[derive(Debug, Default, Clone)]
struct TagInfo {
    json_name: Option<String>,
    skip: bool,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
    min_len: Option<u64>,
    max_len: Option<u64>,
    pattern: Option<String>,
    format: Option<String>,
    enum_values: Option<Vec<String>>,
}

fn tag_values(tag: &str, key: &str) -> Option<String> {
    let needle = format!("{key}:\"");
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn parse_struct_tag(tag: &str) -> TagInfo {
    let tag = tag.trim_matches('`');
    let mut info = TagInfo::default();

    if let Some(json_val) = tag_values(tag, "json") {
        let mut parts = json_val.split(',');
        if let Some(first) = parts.next() {
            if first == "-" {
                info.skip = true;
            } else if !first.is_empty() {
                info.json_name = Some(first.to_string());
            }
        }
    }

    if let Some(validate_val) = tag_values(tag, "validate") {
        for rule in validate_val.split(',') {
            apply_validate_rule(&mut info, rule.trim());
        }
    }

    if let Some(min) = tag_values(tag, "min") {
        info.min = min.parse().ok();
    }
    if let Some(max) = tag_values(tag, "max") {
        info.max = max.parse().ok();
    }
    if let Some(regexp) = tag_values(tag, "regexp") {
        info.pattern = Some(regexp);
    }
    if let Some(enum_val) = tag_values(tag, "enum") {
        info.enum_values = Some(enum_val.split('|').map(|s| s.trim().to_string()).collect());
    }

    info
}

fn apply_validate_rule(info: &mut TagInfo, rule: &str) {
    if rule.is_empty() {
        return;
    }
    if rule == "required" {
        info.required = true;
        return;
    }
    if let Some((key, value)) = rule.split_once('=') {
        match key {
            "min" => info.min = value.parse().ok(),
            "max" => info.max = value.parse().ok(),
            "len" => {
                info.min_len = value.parse().ok();
                info.max_len = value.parse().ok();
            }
            "minlen" => info.min_len = value.parse().ok(),
            "maxlen" => info.max_len = value.parse().ok(),
            "oneof" => info.enum_values = Some(value.split_whitespace().map(String::from).collect()),
            "regexp" => info.pattern = Some(value.to_string()),
            _ => {}
        }
        return;
    }
    if let Some((pattern, format)) = named_predicate(rule) {
        if let Some(p) = pattern {
            info.pattern = Some(p.to_string());
        }
        if let Some(f) = format {
            info.format = Some(f.to_string());
        }
    }
}

/// Maps a fixed catalog of named `validate:"..."` predicates to a
/// pattern and/or OpenAPI `format`.
fn named_predicate(name: &str) -> Option<(Option<&'static str>, Option<&'static str>)> {
    Some(match name {
        "email" => (None, Some("email")),
        "url" | "uri" => (None, Some("uri")),
        "uuid" | "uuid3" | "uuid4" | "uuid5" => (None, Some("uuid")),
        "ulid" => (Some(r"^[0-7][0-9A-HJKMNP-TV-Z]{25}$"), None),
        "alpha" => (Some(r"^[a-zA-Z]+$"), None),
        "alphanum" => (Some(r"^[a-zA-Z0-9]+$"), None),
        "numeric" => (Some(r"^[0-9]+$"), None),
        "hexadecimal" => (Some(r"^[0-9a-fA-F]+$"), None),
        "hexcolor" => (Some(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$"), None),
        "rgb" => (Some(r"^rgb\("), None),
        "rgba" => (Some(r"^rgba\("), None),
        "hsl" => (Some(r"^hsl\("), None),
        "hsla" => (Some(r"^hsla\("), None),
        "base64" => (Some(r"^[A-Za-z0-9+/]+={0,2}$"), None),
        "base64url" => (Some(r"^[A-Za-z0-9_-]+={0,2}$"), None),
        "datetime" => (None, Some("date-time")),
        "date" => (None, Some("date")),
        "time" => (None, Some("time")),
        "ip" | "ip_addr" => (None, None),
        "ipv4" => (None, Some("ipv4")),
        "ipv6" => (None, Some("ipv6")),
        "cidr" | "cidrv4" | "cidrv6" => (None, None),
        "tcp_addr" | "tcp4_addr" | "tcp6_addr" => (None, None),
        "udp_addr" | "udp4_addr" | "udp6_addr" => (None, None),
        "unix_addr" => (None, None),
        "mac" => (Some(r"^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$"), None),
        "hostname" | "fqdn" => (Some(r"^[a-zA-Z0-9.-]+$"), None),
        "isbn10" => (Some(r"^\d{9}[\dXx]$"), None),
        "isbn13" => (Some(r"^\d{13}$"), None),
        "issn" => (Some(r"^\d{4}-\d{3}[\dXx]$"), None),
        "ascii" => (Some(r"^[\x00-\x7F]+$"), None),
        "printascii" => (Some(r"^[\x20-\x7E]+$"), None),
        "multibyte" => (None, None),
        "datauri" => (Some(r"^data:"), None),
        "latitude" => (None, None),
        "longitude" => (None, None),
        "ssn" => (Some(r"^\d{3}-\d{2}-\d{4}$"), None),
        "credit_card" => (Some(r"^[0-9]{12,19}$"), None),
        "mongodb" => (Some(r"^[0-9a-fA-F]{24}$"), None),
        "cron" => (None, None),
        _ => return None,
    })
}

fn apply_constraints(schema: &mut Value, tag: &TagInfo) {
    let Some(obj) = schema.as_object_mut() else { return };
    let ty = obj.get("type").and_then(Value::as_str).map(String::from);

    match ty.as_deref() {
        Some("string") => {
            if let Some(min_len) = tag.min_len.or(tag.min.map(|v| v as u64)) {
                obj.insert("minLength".to_string(), json!(min_len));
            }
            if let Some(max_len) = tag.max_len.or(tag.max.map(|v| v as u64)) {
                obj.insert("maxLength".to_string(), json!(max_len));
            }
        }
        Some("integer") | Some("number") => {
            if let Some(min) = tag.min {
                obj.insert("minimum".to_string(), json!(min));
            }
            if let Some(max) = tag.max {
                obj.insert("maximum".to_string(), json!(max));
            }
        }
        _ => {}
    }

    if let Some(pattern) = &tag.pattern {
        obj.insert("pattern".to_string(), json!(pattern));
    }
    if let Some(format) = &tag.format {
        obj.insert("format".to_string(), json!(format));
    }
    if let Some(enum_values) = &tag.enum_values {
        apply_enum_to(obj, enum_values.clone(), ty.as_deref());
    }
}

fn attach_enum(schema: &mut Value, values: Vec<String>) {
    if let Some(obj) = schema.as_object_mut() {
        let ty = obj.get("type").and_then(Value::as_str).map(String::from);
        apply_enum_to(obj, values, ty.as_deref());
    }
}

/// Places `enum` according to the target's shape: on `array` targets
/// `items.enum`; on `object` targets `additionalProperties.enum`; else
/// the schema itself.
fn apply_enum_to(obj: &mut Map<String, Value>, mut values: Vec<String>, ty: Option<&str>) {
    values.sort();
    match ty {
        Some("array") => {
            if let Some(items) = obj.get_mut("items").and_then(Value::as_object_mut) {
                items.insert("enum".to_string(), json!(values));
            }
        }
        Some("object") => {
            if let Some(additional) = obj.get_mut("additionalProperties").and_then(Value::as_object_mut) {
                additional.insert("enum".to_string(), json!(values));
            } else {
                obj.insert("enum".to_string(), json!(values));
            }
        }
        _ => {
            obj.insert("enum".to_string(), json!(values));
        }
    }
}

/// Searches the owning package for `const` declarations whose declared
/// type matches `field_type` (directly, or via package-qualified match),
/// including iota-group constants sharing a group index with a typed
/// constant. Returns the sorted, deduplicated string values, or `None`
/// if no matching constants were found.
fn detect_enum(pkg: &str, field_type: &str, meta: &Metadata) -> Option<Vec<String>> {
    let bare_name = field_type.rsplit("-->").next().unwrap_or(field_type);
    let Some(package) = meta.packages.get(pkg) else { return None };

    let mut group_indices: HashSet<i64> = HashSet::new();
    let mut values: Vec<String> = Vec::new();

    for file in package.files.values() {
        for var in file.variables.values() {
            if var.tok == "const" && type_matches(&var.type_, bare_name, field_type) {
                group_indices.insert(var.group_index);
            }
        }
    }
    if group_indices.is_empty() {
        return None;
    }

    for file in package.files.values() {
        for var in file.variables.values() {
            if var.tok != "const" {
                continue;
            }
            let same_type = type_matches(&var.type_, bare_name, field_type);
            let same_group = var.group_index >= 0 && group_indices.contains(&var.group_index);
            if same_type || same_group {
                values.push(const_value(var));
            }
        }
    }

    if values.is_empty() {
        None
    } else {
        values.sort();
        values.dedup();
        Some(values)
    }
}

fn type_matches(declared: &str, bare_name: &str, qualified: &str) -> bool {
    declared == bare_name || declared == qualified || declared.rsplit("-->").next() == Some(bare_name)
}

fn const_value(var: &VariableInfo) -> String {
    if let Some(computed) = &var.computed_value {
        return computed.clone();
    }
    var.value.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::{FieldDef, Package};
    use std::collections::HashMap;

    fn meta_with_status_enum() -> Metadata {
        let mut file = FileTable::default();
        file.variables.insert(
            "Active".into(),
            VariableInfo { type_: "Status".into(), value: "\"active\"".into(), tok: "const".into(), group_index: 0, ..Default::default() },
        );
        file.variables.insert(
            "Pending".into(),
            VariableInfo { type_: "Status".into(), value: "\"pending\"".into(), tok: "const".into(), group_index: 0, ..Default::default() },
        );
        file.types.insert("Status".into(), TypeDef { kind: TypeKind::Alias { target: "string".into() } });
        let mut pkg = Package::default();
        pkg.files.insert("status.go".into(), file);
        let mut meta = Metadata::default();
        meta.packages.insert("app".into(), pkg);
        meta
    }

    #[test]
    fn alias_over_primitive_gets_enum_from_grouped_constants() {
        let meta = meta_with_status_enum();
        let mut used = HashSet::new();
        used.insert("app-->Status".to_string());
        let schemas = build_schemas(&used, &meta, &ApiSpecConfig::default());
        let schema = &schemas["app.Status"];
        assert_eq!(schema["type"], json!("string"));
        assert_eq!(schema["enum"], json!(["active", "pending"]));
    }

    #[test]
    fn struct_with_json_tag_remaps_field_name() {
        let mut file = FileTable::default();
        file.types.insert(
            "User".into(),
            TypeDef {
                kind: TypeKind::Struct {
                    fields: vec![FieldDef { name: "ID".into(), type_: "string".into(), tag: r#"json:"id""#.into() }],
                },
            },
        );
        let mut pkg = Package::default();
        pkg.files.insert("user.go".into(), file);
        let mut meta = Metadata::default();
        meta.packages.insert("app".into(), pkg);

        let mut used = HashSet::new();
        used.insert("app-->User".to_string());
        let schemas = build_schemas(&used, &meta, &ApiSpecConfig::default());
        let schema = &schemas["app.User"];
        assert!(schema["properties"].get("id").is_some());
        assert!(schema["properties"].get("ID").is_none());
    }

    #[test]
    fn required_validate_rule_feeds_struct_required_list() {
        let mut file = FileTable::default();
        file.types.insert(
            "User".into(),
            TypeDef {
                kind: TypeKind::Struct {
                    fields: vec![FieldDef { name: "Name".into(), type_: "string".into(), tag: r#"json:"name" validate:"required,min=3""#.into() }],
                },
            },
        );
        let mut pkg = Package::default();
        pkg.files.insert("user.go".into(), file);
        let mut meta = Metadata::default();
        meta.packages.insert("app".into(), pkg);

        let mut used = HashSet::new();
        used.insert("app-->User".to_string());
        let schemas = build_schemas(&used, &meta, &ApiSpecConfig::default());
        let schema = &schemas["app.User"];
        assert_eq!(schema["required"], json!(["name"]));
        assert_eq!(schema["properties"]["name"]["minLength"], json!(3));
    }

    #[test]
    fn cyclic_struct_reference_does_not_recurse_forever() {
        let mut file = FileTable::default();
        file.types.insert(
            "Node".into(),
            TypeDef {
                kind: TypeKind::Struct {
                    fields: vec![FieldDef { name: "Next".into(), type_: "app-->Node".into(), tag: String::new() }],
                },
            },
        );
        let mut pkg = Package::default();
        pkg.files.insert("node.go".into(), file);
        let mut meta = Metadata::default();
        meta.packages.insert("app".into(), pkg);

        let mut used = HashSet::new();
        used.insert("app-->Node".to_string());
        let schemas = build_schemas(&used, &meta, &ApiSpecConfig::default());
        assert!(schemas.contains_key("app.Node"));
        assert_eq!(schemas["app.Node"]["properties"]["Next"]["$ref"], json!("#/components/schemas/app.Node"));
    }

    #[test]
    fn external_type_short_circuits_metadata_lookup() {
        let meta = Metadata::default();
        let config = ApiSpecConfig {
            external_types: vec![crate::patterns::ExternalType { name: "uuid.UUID".into(), schema: json!({"type": "string", "format": "uuid"}) }],
            ..Default::default()
        };
        let mut used = HashSet::new();
        used.insert("uuid.UUID".to_string());
        let schemas = build_schemas(&used, &meta, &config);
        assert_eq!(schemas["uuid.UUID"]["format"], json!("uuid"));
    }

    #[test]
    fn interface_type_is_empty_object() {
        let mut file = FileTable::default();
        file.types.insert("Writer".into(), TypeDef { kind: TypeKind::Interface });
        let mut pkg = Package::default();
        pkg.files.insert("w.go".into(), file);
        let mut meta = Metadata::default();
        meta.packages.insert("app".into(), pkg);

        let mut used = HashSet::new();
        used.insert("app-->Writer".to_string());
        let schemas = build_schemas(&used, &meta, &ApiSpecConfig::default());
        assert_eq!(schemas["app.Writer"], json!({"type": "object"}));
    }
}
