//! Core type model and declaration IR for tsbind

pub mod error;
pub mod ir;
pub mod naming;
pub mod types;

pub use error::CoreError;
pub use ir::{DeclTable, ExportedValue, Module, Project, ProjectBuilder, TypeDecl};
pub use types::{Param, Primitive, RecordField, RecordRepr, SourceType, TargetType};
