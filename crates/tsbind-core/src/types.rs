//! Source- and target-side type expressions
//!
//! `SourceType` is the type vocabulary of the foreign, strongly-typed
//! compiled module; `TargetType` is its TypeScript-side structural
//! equivalent. Both are plain data with structural equality: the mapper
//! derives one from the other and never mutates either.

use serde::{Deserialize, Serialize};

/// Primitive types shared by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Int,
    Float,
    Bool,
    Unit,
}

impl Primitive {
    /// The TypeScript spelling of this primitive.
    pub fn ts_name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Int | Primitive::Float => "number",
            Primitive::Bool => "boolean",
            Primitive::Unit => "void",
        }
    }
}

/// How the compiler laid out a record at runtime.
///
/// Field-keyed records are already plain objects and cross the boundary
/// as-is; positional records compile to arrays indexed in declaration
/// order and need a runtime conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordRepr {
    FieldKeyed,
    Positional,
}

/// A record field. Declaration order is significant: positional records
/// are indexed by it, so fields live in a `Vec`, never a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub ty: SourceType,
}

/// A function parameter. Labeled parameters bundle into a single object
/// argument on the TypeScript side; unlabeled ones stay positional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub ty: SourceType,
}

impl Param {
    pub fn positional(ty: SourceType) -> Self {
        Self { label: None, ty }
    }

    pub fn labeled(label: impl Into<String>, ty: SourceType) -> Self {
        Self {
            label: Some(label.into()),
            ty,
        }
    }
}

/// Type expression from the foreign compiled module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceType {
    Primitive { primitive: Primitive },

    /// Product type with declared field order and a compiled representation.
    Record {
        fields: Vec<RecordField>,
        repr: RecordRepr,
    },

    /// Anonymous product type; already positional at runtime.
    Tuple { elements: Vec<SourceType> },

    Function {
        params: Vec<Param>,
        curried: bool,
        ret: Box<SourceType>,
    },

    /// Reference to a named type declaration visible to the exports.
    Ref { name: String },

    /// An abstraction with no structural representation on the host side.
    /// The mapper has no rule for this; exports using it are skipped.
    Abstract { name: String },
}

impl SourceType {
    pub fn primitive(p: Primitive) -> Self {
        SourceType::Primitive { primitive: p }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        SourceType::Ref { name: name.into() }
    }

    pub fn record(fields: Vec<(&str, SourceType)>, repr: RecordRepr) -> Self {
        SourceType::Record {
            fields: fields
                .into_iter()
                .map(|(name, ty)| RecordField {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
            repr,
        }
    }

    /// Names of the type declarations this expression refers to, in
    /// first-occurrence order. Shallow: does not chase the referenced
    /// declarations themselves.
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_refs(&mut names);
        names
    }

    fn collect_refs(&self, out: &mut Vec<String>) {
        match self {
            SourceType::Primitive { .. } | SourceType::Abstract { .. } => {}
            SourceType::Record { fields, .. } => {
                for field in fields {
                    field.ty.collect_refs(out);
                }
            }
            SourceType::Tuple { elements } => {
                for elem in elements {
                    elem.collect_refs(out);
                }
            }
            SourceType::Function { params, ret, .. } => {
                for param in params {
                    param.ty.collect_refs(out);
                }
                ret.collect_refs(out);
            }
            SourceType::Ref { name } => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
        }
    }
}

/// TypeScript-side structural equivalent of a `SourceType`.
///
/// Deliberately small: the host vocabulary is objects, fixed-length
/// tuples, single-parameter-list functions, primitives and references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TargetType {
    Primitive { primitive: Primitive },

    /// Object type with readonly fields in declaration order.
    Object { fields: Vec<(String, TargetType)> },

    /// Fixed-length tuple type, `[T1, T2]`.
    Tuple { elements: Vec<TargetType> },

    /// Function type with one combined parameter list.
    Function {
        params: Vec<(String, TargetType)>,
        ret: Box<TargetType>,
    },

    /// Reference to the mapped equivalent of a named declaration.
    Ref { name: String },
}

impl TargetType {
    pub fn primitive(p: Primitive) -> Self {
        TargetType::Primitive { primitive: p }
    }

    /// Whether a value of this type is callable. Wrapped non-function
    /// exports cannot be hoisted with a placeholder binding, which is
    /// what makes this distinction load-bearing for the resolver.
    pub fn is_function(&self) -> bool {
        matches!(self, TargetType::Function { .. })
    }
}
