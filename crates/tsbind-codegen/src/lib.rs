//! Type mapping and wrapper emission engine
//!
//! One `Generator` serves a whole run: it owns the read-only declaration
//! table and the module cycle analysis, and generates each module
//! independently. A recoverable problem skips one export and leaves a
//! diagnostic; a module-scope error aborts that module and nothing else.

pub mod emit;
pub mod error;
pub mod hoist;
pub mod mapper;
pub mod plan;
pub mod typescript;
pub mod wrapper;

pub use emit::EmissionUnit;
pub use error::{CodegenError, Diagnostic, DiagnosticKind, DiagnosticSink, Severity};
pub use plan::ConversionPlan;

use crate::hoist::CycleSet;
use crate::mapper::{MapError, MapWarning, TypeMapper};
use crate::wrapper::SynthesizedExport;
use tracing::{debug, info, warn};
use tsbind_core::{naming, DeclTable, Module, Project, TargetType};

/// Everything the emission layer needs for one module.
#[derive(Debug, Clone)]
pub struct ModuleOutput {
    pub module: String,
    pub compiled_path: String,
    pub units: Vec<EmissionUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-module outcome of a run; failures never cross module boundaries.
#[derive(Debug)]
pub struct ModuleResult {
    pub name: String,
    pub result: Result<ModuleOutput, CodegenError>,
}

pub struct Generator {
    decls: DeclTable,
    cycles: CycleSet,
}

impl Generator {
    pub fn new(project: &Project) -> Self {
        Self {
            decls: DeclTable::from_project(project),
            cycles: CycleSet::from_project(project),
        }
    }

    /// Generate every module. Each module either completes or aborts
    /// atomically; sibling modules are unaffected either way.
    pub fn generate(&self, project: &Project) -> Vec<ModuleResult> {
        project
            .modules
            .iter()
            .map(|module| {
                let result = self.generate_module(module);
                if let Err(ref e) = result {
                    warn!(module = module.name.as_str(), error = %e, "module aborted");
                }
                ModuleResult {
                    name: module.name.clone(),
                    result,
                }
            })
            .collect()
    }

    pub fn generate_module(&self, module: &Module) -> Result<ModuleOutput, CodegenError> {
        let mut mapper = TypeMapper::new(&module.name, &self.decls);
        let mut sink = DiagnosticSink::new();
        let in_cycle = self.cycles.contains(&module.name);
        let mut exports: Vec<(SynthesizedExport, bool)> = Vec::new();

        for export in &module.exports {
            if !naming::is_valid_ts_ident(&export.name) {
                sink.push(Diagnostic::skipped_export(
                    DiagnosticKind::UnsupportedType,
                    &module.name,
                    &export.name,
                    "name is not a valid host identifier",
                ));
                continue;
            }

            // Warnings are drained on both outcomes: they belong to the
            // export whose mapping raised them, not to whichever export
            // happens to be mapped next.
            let mapped = match mapper.map(&export.ty) {
                Ok(mapped) => {
                    drain_export_warnings(&mut mapper, &mut sink, &module.name, &export.name);
                    mapped
                }
                Err(e) if e.is_recoverable() => {
                    drain_export_warnings(&mut mapper, &mut sink, &module.name, &export.name);
                    sink.push(Diagnostic::skipped_export(
                        kind_of(&e),
                        &module.name,
                        &export.name,
                        e.to_string(),
                    ));
                    continue;
                }
                Err(e) => return Err(module_error(&module.name, e)),
            };

            let synthesized = wrapper::synthesize(&export.name, &mapped)?;
            let must_hoist = hoist::resolve_hoisting(&module.name, in_cycle, &synthesized)?;
            exports.push((synthesized, must_hoist));
        }

        let decls = self.collect_decls(module, &mut mapper, &mut sink)?;

        info!(
            module = module.name.as_str(),
            exports = exports.len(),
            decls = decls.len(),
            diagnostics = sink.len(),
            "module generated"
        );

        Ok(ModuleOutput {
            module: module.name.clone(),
            compiled_path: module.compiled_path(),
            units: emit::assemble(&module.compiled_path(), &exports, decls),
            diagnostics: sink.into_entries(),
        })
    }

    /// Map every required declaration to its emitted structural type.
    /// Mapping a declaration body may require further declarations, so
    /// this drains the mapper's list by index until stable.
    fn collect_decls(
        &self,
        module: &Module,
        mapper: &mut TypeMapper<'_>,
        sink: &mut DiagnosticSink,
    ) -> Result<Vec<(String, TargetType)>, CodegenError> {
        let mut decls = Vec::new();
        let mut i = 0;
        while i < mapper.required_decls().len() {
            let name = mapper.required_decls()[i].clone();
            i += 1;

            let decl_ty = match self.decls.resolve(&module.name, &name) {
                Ok(Some(decl)) => decl.ty.clone(),
                Ok(None) => {
                    sink.push(Diagnostic::skipped_type(
                        DiagnosticKind::UnknownType,
                        &module.name,
                        &name,
                        "declaration disappeared during generation",
                    ));
                    continue;
                }
                Err(e) => return Err(module_error(&module.name, MapError::Conflict(e))),
            };

            match mapper.map(&decl_ty) {
                Ok(mapped) => {
                    drain_type_warnings(mapper, sink, &module.name, &name);
                    debug!(module = module.name.as_str(), type_name = name.as_str(), "re-declared type");
                    decls.push((name, mapped.target));
                }
                Err(e) if e.is_recoverable() => {
                    drain_type_warnings(mapper, sink, &module.name, &name);
                    sink.push(Diagnostic::skipped_type(
                        kind_of(&e),
                        &module.name,
                        &name,
                        e.to_string(),
                    ));
                }
                Err(e) => return Err(module_error(&module.name, e)),
            }
        }
        Ok(decls)
    }
}

fn drain_export_warnings(
    mapper: &mut TypeMapper<'_>,
    sink: &mut DiagnosticSink,
    module: &str,
    export: &str,
) {
    for warning in mapper.take_warnings() {
        let MapWarning::UnconvertedReturn { type_name } = warning;
        sink.push(Diagnostic::warning(
            DiagnosticKind::UnconvertedReturn,
            module,
            export,
            unconverted_return_message(&type_name),
        ));
    }
}

fn drain_type_warnings(
    mapper: &mut TypeMapper<'_>,
    sink: &mut DiagnosticSink,
    module: &str,
    type_name: &str,
) {
    for warning in mapper.take_warnings() {
        let MapWarning::UnconvertedReturn { type_name: ret } = warning;
        sink.push(Diagnostic::type_warning(
            DiagnosticKind::UnconvertedReturn,
            module,
            type_name,
            unconverted_return_message(&ret),
        ));
    }
}

fn unconverted_return_message(type_name: &str) -> String {
    format!(
        "return type '{}' needs a conversion; results are forwarded unchanged",
        type_name
    )
}

fn kind_of(error: &MapError) -> DiagnosticKind {
    match error {
        MapError::Unsupported(_) => DiagnosticKind::UnsupportedType,
        MapError::UnknownType(_) => DiagnosticKind::UnknownType,
        MapError::RecursiveConversion(_) => DiagnosticKind::UnsupportedType,
        MapError::Conflict(_) => DiagnosticKind::UnknownType,
    }
}

fn module_error(module: &str, error: MapError) -> CodegenError {
    match error {
        MapError::Conflict(tsbind_core::CoreError::RedeclarationConflict { name, .. }) => {
            CodegenError::RedeclarationConflict {
                module: module.to_string(),
                name,
            }
        }
        other => CodegenError::Generation(other.to_string()),
    }
}
