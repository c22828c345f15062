//! Declaration IR supplied by the collector front-end
//!
//! Everything here is a read-only fact for the duration of one generation
//! run: the exported value signatures, the named type declarations visible
//! to them, and the dependency edges between source modules.

use crate::error::CoreError;
use crate::types::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One exported value of a source module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedValue {
    pub name: String,
    pub ty: SourceType,
}

/// A named type definition visible to at least one exported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub ty: SourceType,
}

/// A source module as reported by the declaration collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Module identifier, also the stem of the generated file.
    pub name: String,
    /// Path of the compiled counterpart the wrapper imports from.
    /// Defaults to `./<name>.bs` when the collector leaves it out.
    #[serde(default)]
    pub source_path: Option<String>,
    /// Names of modules this module depends on.
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub type_decls: Vec<TypeDecl>,
    #[serde(default)]
    pub exports: Vec<ExportedValue>,
}

impl Module {
    /// Import path of the compiled counterpart.
    pub fn compiled_path(&self) -> String {
        self.source_path
            .clone()
            .unwrap_or_else(|| format!("./{}.bs", self.name))
    }
}

/// The whole declaration graph for one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub modules: Vec<Module>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Read-only table of named type declarations, shared by every module's
/// generation. A name may be declared by more than one module; lookups
/// resolve per importing module and surface structural conflicts.
#[derive(Debug, Clone, Default)]
pub struct DeclTable {
    /// name -> declarations with their originating module.
    entries: BTreeMap<String, Vec<(String, TypeDecl)>>,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_project(project: &Project) -> Self {
        let mut table = Self::new();
        for module in &project.modules {
            for decl in &module.type_decls {
                table.insert(&module.name, decl.clone());
            }
        }
        table
    }

    pub fn insert(&mut self, origin: &str, decl: TypeDecl) {
        self.entries
            .entry(decl.name.clone())
            .or_default()
            .push((origin.to_string(), decl));
    }

    /// Resolve `name` for a lookup performed while generating `module`.
    ///
    /// A declaration from the module itself wins. Otherwise all known
    /// declarations of that name must be structurally identical; if two
    /// incompatible ones would both be required, that is a
    /// `RedeclarationConflict` at the module scope.
    pub fn resolve(&self, module: &str, name: &str) -> Result<Option<&TypeDecl>, CoreError> {
        let Some(candidates) = self.entries.get(name) else {
            return Ok(None);
        };

        if let Some((_, decl)) = candidates.iter().find(|(origin, _)| origin == module) {
            return Ok(Some(decl));
        }

        let mut found: Option<&TypeDecl> = None;
        for (origin, decl) in candidates {
            match found {
                None => found = Some(decl),
                Some(prev) if prev.ty == decl.ty => {}
                Some(_) => {
                    tracing::warn!(
                        module,
                        type_name = name,
                        conflicting_origin = origin.as_str(),
                        "structurally incompatible redeclarations required"
                    );
                    return Err(CoreError::RedeclarationConflict {
                        module: module.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(found)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for assembling projects in tests and ad-hoc tooling.
pub struct ProjectBuilder {
    project: Project,
    current: Option<Module>,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            project: Project::new(),
            current: None,
        }
    }

    pub fn module(mut self, name: impl Into<String>) -> Self {
        if let Some(module) = self.current.take() {
            self.project.modules.push(module);
        }
        self.current = Some(Module {
            name: name.into(),
            source_path: None,
            deps: Vec::new(),
            type_decls: Vec::new(),
            exports: Vec::new(),
        });
        self
    }

    pub fn dep(mut self, name: impl Into<String>) -> Self {
        if let Some(ref mut module) = self.current {
            module.deps.push(name.into());
        }
        self
    }

    pub fn type_decl(mut self, name: impl Into<String>, ty: SourceType) -> Self {
        if let Some(ref mut module) = self.current {
            module.type_decls.push(TypeDecl {
                name: name.into(),
                ty,
            });
        }
        self
    }

    pub fn export(mut self, name: impl Into<String>, ty: SourceType) -> Self {
        if let Some(ref mut module) = self.current {
            module.exports.push(ExportedValue {
                name: name.into(),
                ty,
            });
        }
        self
    }

    pub fn build(mut self) -> Project {
        if let Some(module) = self.current.take() {
            self.project.modules.push(module);
        }
        self.project
    }
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
