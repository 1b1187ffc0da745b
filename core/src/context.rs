#![deny(missing_docs)]

//! # Context Provider
//!
//! Resolves interned string indices to strings and derives the canonical
//! textual form of a call argument. Every operation here is infallible:
//! absence of data yields `""`, never an error or a panic.

use crate::callgraph::{ArgKind, CallArgument, Metadata};

/// The sole translator between the interned pool and plain strings, plus
/// the argument-to-text derivation rules of the distilled spec's §4.1.
pub struct ContextProvider<'m> {
    meta: &'m Metadata,
}

impl<'m> ContextProvider<'m> {
    /// Builds a provider over `meta`.
    pub fn new(meta: &'m Metadata) -> Self {
        ContextProvider { meta }
    }

    /// Resolves a pool index, returning `""` when absent.
    pub fn get_string(&self, idx: crate::strings::StrIdx) -> &str {
        self.meta.get_string(idx)
    }

    /// `(name, pkg, recvType)` of the edge's caller.
    pub fn caller_info(&self, edge: Option<&crate::callgraph::CallGraphEdge>) -> (String, String, String) {
        match edge {
            None => (String::new(), String::new(), String::new()),
            Some(e) => (
                self.get_string(e.caller.name).to_string(),
                self.get_string(e.caller.pkg).to_string(),
                self.get_string(e.caller.recv_type).to_string(),
            ),
        }
    }

    /// `(name, pkg, recvType)` of the edge's callee.
    pub fn callee_info(&self, edge: Option<&crate::callgraph::CallGraphEdge>) -> (String, String, String) {
        match edge {
            None => (String::new(), String::new(), String::new()),
            Some(e) => (
                self.get_string(e.callee.name).to_string(),
                self.get_string(e.callee.pkg).to_string(),
                self.get_string(e.callee.recv_type).to_string(),
            ),
        }
    }

    /// The canonical textual form of `arg`, using `"."` as the default
    /// selector separator.
    pub fn argument_info(&self, arg: &CallArgument) -> String {
        self.argument_info_sep(arg, ".")
    }

    /// As [`Self::argument_info`], with an explicit separator for
    /// selector expressions.
    pub fn argument_info_sep(&self, arg: &CallArgument, sep: &str) -> String {
        match arg.kind {
            Some(ArgKind::Literal) => strip_quotes(self.get_string(arg.value)),
            Some(ArgKind::Identifier) => self.identifier_info(arg),
            Some(ArgKind::Selector) => self.selector_info(arg, sep),
            Some(ArgKind::Call) => self.call_info(arg),
            Some(ArgKind::MapType) => self.map_info(arg),
            Some(ArgKind::Unary) | Some(ArgKind::Index) | Some(ArgKind::CompositeLit) => {
                let inner = arg.x.as_deref().map(|x| self.argument_info(x)).unwrap_or_default();
                if matches!(arg.kind, Some(ArgKind::Unary) | Some(ArgKind::Index)) {
                    format!("*{}", inner)
                } else {
                    inner
                }
            }
            Some(ArgKind::InterfaceType) => "interface{}".to_string(),
            Some(ArgKind::Raw) => self.get_string(arg.raw).to_string(),
            _ => String::new(),
        }
    }

    fn identifier_info(&self, arg: &CallArgument) -> String {
        let name = self.get_string(arg.name);
        let pkg = self.get_string(arg.pkg);
        let ty = self.get_string(arg.type_);

        // Declared package const? substitute its quoted value.
        if !pkg.is_empty() {
            if let Some(var) = self.meta.find_variable(pkg, name) {
                if var.tok == "const" {
                    return strip_quotes(&var.value);
                }
            }
        }

        if crate::schema_mapper::is_primitive(ty) {
            return ty.to_string();
        }
        if !pkg.is_empty() && !ty.is_empty() {
            let (prefix, bare) = split_wrapper(ty);
            return format!("{prefix}{pkg}-->{bare}");
        }
        if !pkg.is_empty() && ty.is_empty() && !name.is_empty() {
            if pkg.ends_with(name) {
                return pkg.to_string();
            }
            return format!("{pkg}/{name}");
        }
        name.to_string()
    }

    fn selector_info(&self, arg: &CallArgument, sep: &str) -> String {
        let base = arg.x.as_deref().map(|x| self.argument_info(x)).unwrap_or_default();
        let sel = self.get_string(arg.sel);
        let base_pkg = self.get_string(arg.pkg);
        if !base_pkg.is_empty() {
            if let Some(var) = self.meta.find_variable(base_pkg, sel) {
                return strip_quotes(&var.value);
            }
        }
        if base.is_empty() {
            sel.to_string()
        } else {
            format!("{base}{sep}{sel}")
        }
    }

    fn call_info(&self, arg: &CallArgument) -> String {
        let base = arg.fun.as_deref().map(|f| self.argument_info(f)).unwrap_or_default();
        if arg.type_params.is_empty() {
            return base;
        }
        let params: Vec<String> = arg.type_params.iter().map(|idx| self.get_string(*idx).to_string()).collect();
        format!("{base}[{}]", params.join(", "))
    }

    fn map_info(&self, arg: &CallArgument) -> String {
        let key = arg.x.as_deref().map(|x| self.argument_info(x)).unwrap_or_default();
        let value = arg.fun.as_deref().map(|f| self.argument_info(f)).unwrap_or_default();
        format!("map[{key}]{value}")
    }
}

/// Strips one layer of surrounding double quotes, if present.
fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Splits a `*T`/`[]T` wrapped type into its prefix and bare name, so the
/// prefix can be re-applied around a qualified `pkg-->Type` form.
fn split_wrapper(ty: &str) -> (&str, &str) {
    if let Some(rest) = ty.strip_prefix("[]") {
        ("[]", rest)
    } else if let Some(rest) = ty.strip_prefix('*') {
        ("*", rest)
    } else {
        ("", ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::{CallGraphEdge, EdgeEndpoint, FileTable, Package, VariableInfo};
    use crate::strings::StringPool;
    use std::collections::HashMap;

    fn meta_with_pool(entries: Vec<&str>) -> Metadata {
        Metadata { pool: StringPool::new(entries.into_iter().map(String::from).collect()), ..Default::default() }
    }

    #[test]
    fn literal_strips_quotes() {
        let meta = meta_with_pool(vec!["\"/users\""]);
        let ctx = ContextProvider::new(&meta);
        let arg = CallArgument::literal(1);
        assert_eq!(ctx.argument_info(&arg), "/users");
    }

    #[test]
    fn identifier_substitutes_declared_const() {
        let mut meta = meta_with_pool(vec!["listUsers", "handlers", "\"value\""]);
        let mut pkg = Package::default();
        pkg.files.insert(
            "h.go".into(),
            FileTable {
                variables: HashMap::from([(
                    "listUsers".into(),
                    VariableInfo { tok: "const".into(), value: "\"value\"".into(), ..Default::default() },
                )]),
                ..Default::default()
            },
        );
        meta.packages.insert("handlers".into(), pkg);
        let ctx = ContextProvider::new(&meta);
        let arg = CallArgument::identifier(1, 0);
        // pkg index 2 => "handlers"
        let arg = CallArgument { pkg: 2, ..arg };
        assert_eq!(ctx.argument_info(&arg), "value");
        let _ = meta_with_pool(vec![]);
    }

    #[test]
    fn identifier_builds_qualified_type_string() {
        let meta = meta_with_pool(vec!["User", "app/models", "app/models-->User"]);
        let ctx = ContextProvider::new(&meta);
        let arg = CallArgument { kind: Some(ArgKind::Identifier), name: 1, pkg: 2, type_: 1, ..Default::default() };
        assert_eq!(ctx.argument_info(&arg), "app/models-->User");
    }

    #[test]
    fn selector_falls_back_to_dotted_form() {
        let meta = meta_with_pool(vec!["r", "Get"]);
        let ctx = ContextProvider::new(&meta);
        let base = CallArgument { kind: Some(ArgKind::Identifier), name: 1, ..Default::default() };
        let arg = CallArgument { kind: Some(ArgKind::Selector), x: Some(Box::new(base)), sel: 2, ..Default::default() };
        assert_eq!(ctx.argument_info(&arg), "r.Get");
    }

    #[test]
    fn absent_edge_returns_empty_strings() {
        let meta = Metadata::default();
        let ctx = ContextProvider::new(&meta);
        assert_eq!(ctx.caller_info(None), (String::new(), String::new(), String::new()));
        assert_eq!(ctx.callee_info(None), (String::new(), String::new(), String::new()));
    }

    #[test]
    fn call_appends_generic_suffix() {
        let meta = meta_with_pool(vec!["NewContainer", "pkg-->User"]);
        let ctx = ContextProvider::new(&meta);
        let fun = CallArgument { kind: Some(ArgKind::Identifier), name: 1, ..Default::default() };
        let arg = CallArgument { kind: Some(ArgKind::Call), fun: Some(Box::new(fun)), type_params: vec![2], ..Default::default() };
        assert_eq!(ctx.argument_info(&arg), "NewContainer[pkg-->User]");
    }
}
