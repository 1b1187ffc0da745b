#![deny(missing_docs)]

//! # Call Graph & Metadata Model
//!
//! The typed shape of the pipeline's sole input contract: an interned
//! string pool, per-package type/variable/function tables, and the global
//! list of call-graph edges. Everything here is a plain, `serde`-derived
//! data structure — the producer (an external, out-of-process tool) emits
//! it as JSON; this crate only reads it.

use crate::strings::{StrIdx, StringPool};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One endpoint (caller or callee) of a call-graph edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeEndpoint {
    /// Interned function/method name.
    pub name: StrIdx,
    /// Interned package path.
    pub pkg: StrIdx,
    /// Interned receiver type name (0 when the function has no receiver).
    #[serde(default)]
    pub recv_type: StrIdx,
}

/// Discriminant of [`CallArgument`]'s tagged-union shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ArgKind {
    /// A literal value (string, int, float, bool, nil).
    Literal,
    /// A bare identifier.
    Identifier,
    /// A `base.Sel` selector expression.
    Selector,
    /// A call expression `Fun(args...)`.
    Call,
    /// A unary expression (e.g. `&x`).
    Unary,
    /// A `*x` star/dereference expression.
    Star,
    /// An index expression `x[i]`.
    Index,
    /// A composite literal `T{...}`.
    CompositeLit,
    /// A `key: value` pair inside a composite literal.
    KeyValue,
    /// A `map[K]V` type expression.
    MapType,
    /// An `interface{}` type expression.
    InterfaceType,
    /// A type-assertion `x.(T)`.
    TypeAssert,
    /// A type-conversion `T(x)`.
    TypeConversion,
    /// Raw, not further structured text.
    Raw,
    /// A function type expression `func(...) ...`.
    FuncType,
}

/// One call argument. Immutable once constructed; fields are an
/// open-ended subset depending on `kind`, matching the producer's JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallArgument {
    /// Which variant this argument is.
    pub kind: Option<ArgKind>,
    /// Literal/identifier textual value.
    #[serde(default)]
    pub value: StrIdx,
    /// Identifier/selector/field name.
    #[serde(default)]
    pub name: StrIdx,
    /// Known or declared type of this argument, when present.
    #[serde(default, rename = "type")]
    pub type_: StrIdx,
    /// Owning package, when present.
    #[serde(default)]
    pub pkg: StrIdx,
    /// Raw source text, used by the `Raw` kind.
    #[serde(default)]
    pub raw: StrIdx,
    /// Child expression, e.g. the operand of `Unary`/`Star`/`Index`/`CompositeLit`.
    #[serde(default)]
    pub x: Option<Box<CallArgument>>,
    /// Function expression of a `Call`.
    #[serde(default)]
    pub fun: Option<Box<CallArgument>>,
    /// Selected field name of a `Selector`.
    #[serde(default)]
    pub sel: StrIdx,
    /// Ordered child arguments (call arguments, composite literal elements).
    #[serde(default)]
    pub args: Vec<CallArgument>,
    /// Type parameters supplied at a generic call site, positional.
    #[serde(default)]
    pub type_params: Vec<StrIdx>,
    /// Pre-computed resolved type index, when the producer already knows it.
    #[serde(default)]
    pub resolved_type: StrIdx,
    /// Set when this argument's type is itself a generic parameter name.
    #[serde(default)]
    pub generic_type_name: StrIdx,
    /// Source position, opaque to the pipeline.
    #[serde(default)]
    pub position: StrIdx,
}

impl CallArgument {
    /// Builds a bare `Literal` argument carrying `value` (already interned).
    pub fn literal(value: StrIdx) -> Self {
        CallArgument { kind: Some(ArgKind::Literal), value, ..Default::default() }
    }

    /// Builds a bare `Identifier` argument.
    pub fn identifier(name: StrIdx, type_: StrIdx) -> Self {
        CallArgument { kind: Some(ArgKind::Identifier), name, type_, ..Default::default() }
    }
}

/// One assignment recorded against a variable name: `{variableName,
/// concreteType, pkg}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    /// The assigned-to variable's name.
    pub variable_name: String,
    /// The concrete type key the assignment resolves to.
    #[serde(default)]
    pub concrete_type: String,
    /// The owning package of the assignment.
    #[serde(default)]
    pub pkg: String,
}

/// One edge of the call graph: a recorded call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallGraphEdge {
    /// The calling function/method.
    pub caller: EdgeEndpoint,
    /// The called function/method.
    pub callee: EdgeEndpoint,
    /// Opaque source position.
    #[serde(default)]
    pub position: StrIdx,
    /// Ordered arguments passed at this call site.
    #[serde(default)]
    pub arguments: Vec<CallArgument>,
    /// Generic parameter name -> concrete type name, for this call.
    #[serde(default)]
    pub type_param_map: HashMap<String, String>,
    /// Variable name -> history of assignments observed for it.
    #[serde(default)]
    pub assignment_map: HashMap<String, Vec<Assignment>>,
    /// Callee parameter name -> index into `arguments` bound to it.
    #[serde(default)]
    pub param_arg_map: HashMap<String, usize>,
}

/// One field of a `struct` type declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name as declared.
    pub name: String,
    /// Declared field type key.
    #[serde(rename = "type")]
    pub type_: String,
    /// Raw, unparsed struct tag (e.g. `` `json:"id" validate:"required"` ``).
    #[serde(default)]
    pub tag: String,
}

/// The declared shape of a type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TypeKind {
    /// A struct with fields.
    Struct {
        /// Declared fields, in source order.
        fields: Vec<FieldDef>,
    },
    /// An interface type (method set; fields are irrelevant to schema lowering).
    Interface,
    /// A type alias / defined type over another type.
    Alias {
        /// The aliased/underlying type key.
        target: String,
    },
    /// Anything else (channels, funcs as named types, ...).
    Other,
}

impl Default for TypeKind {
    fn default() -> Self {
        TypeKind::Other
    }
}

/// One declared type within a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeDef {
    /// The type's own declared shape.
    #[serde(flatten)]
    pub kind: TypeKind,
}

/// One declared package-level variable or constant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableInfo {
    /// Declared or inferred type key.
    #[serde(rename = "type", default)]
    pub type_: String,
    /// Literal source text of the initializer, if any.
    #[serde(default)]
    pub value: String,
    /// `const` or `var`.
    #[serde(default)]
    pub tok: String,
    /// Index of the enclosing `const (...)`/`var (...)` group, for iota
    /// detection. `-1` when the declaration is not part of a group.
    #[serde(default = "default_group_index")]
    pub group_index: i64,
    /// The producer's evaluated value of a `const`, when it was able to
    /// compute one (e.g. resolving `.String()` or an iota expression).
    #[serde(default)]
    pub computed_value: Option<String>,
    /// A secondary type resolution hint, when the declared type is itself
    /// an alias.
    #[serde(default)]
    pub resolved_type: Option<String>,
}

fn default_group_index() -> i64 {
    -1
}

/// One file's worth of declarations within a package.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileTable {
    /// Types declared in this file, keyed by name.
    #[serde(default)]
    pub types: HashMap<String, TypeDef>,
    /// Package-level variables and constants declared in this file.
    #[serde(default)]
    pub variables: HashMap<String, VariableInfo>,
    /// Function names declared in this file (body is irrelevant to this
    /// pipeline; presence is what matters for function-context lookups).
    #[serde(default)]
    pub functions: Vec<String>,
}

/// One package's files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    /// Files belonging to this package, keyed by path.
    #[serde(default)]
    pub files: HashMap<String, FileTable>,
}

/// The whole input contract: pool, packages, and the global edge list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    /// The interned string pool every `StrIdx` in this document refers to.
    #[serde(default)]
    pub pool: StringPool,
    /// Packages, keyed by import/package path.
    #[serde(default)]
    pub packages: HashMap<String, Package>,
    /// Every recorded call-graph edge, in no particular order.
    #[serde(default)]
    pub edges: Vec<CallGraphEdge>,
}

impl Metadata {
    /// Resolves a pool index to its string, or `""` when absent.
    pub fn get_string(&self, idx: StrIdx) -> &str {
        self.pool.get(idx)
    }

    /// Looks up a declared variable by `(pkg, name)`, scanning every file
    /// of that package. Returns the first match; packages are not
    /// expected to redeclare the same package-level name twice.
    pub fn find_variable(&self, pkg: &str, name: &str) -> Option<&VariableInfo> {
        self.packages.get(pkg)?.files.values().find_map(|f| f.variables.get(name))
    }

    /// Looks up a declared type by `(pkg, name)`.
    pub fn find_type(&self, pkg: &str, name: &str) -> Option<&TypeDef> {
        self.packages.get(pkg)?.files.values().find_map(|f| f.types.get(name))
    }

    /// Finds `(file_path, &FileTable)` of the file in `pkg` declaring
    /// function `func_name`, if any.
    pub fn function_context<'a>(
        &'a self,
        pkg: &str,
        func_name: &str,
    ) -> Option<(&'a str, &'a FileTable)> {
        self.packages
            .get(pkg)?
            .files
            .iter()
            .find(|(_, f)| f.functions.iter().any(|n| n == func_name))
            .map(|(path, f)| (path.as_str(), f))
    }
}
