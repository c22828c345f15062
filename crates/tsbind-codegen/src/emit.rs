//! Emission units
//!
//! The generator's whole contract with the emission layer: an ordered
//! list of units per module. Ordering is the hoist contract — imports of
//! the compiled module first, then checked-binding/wrapper pairs in
//! export order (checked binding always before its wrapper), then
//! re-declared type declarations.

use crate::wrapper::{ExportState, SynthesizedExport, WrapperBody};
use tsbind_core::TargetType;

#[derive(Debug, Clone, PartialEq)]
pub enum EmissionUnit {
    /// `import {name as alias} from 'path'`.
    Import {
        item: String,
        alias: String,
        from: String,
    },

    /// Precisely-typed alias of the raw import. For direct exports this
    /// is the public export itself.
    CheckedBinding {
        name: String,
        /// The export this binding verifies, for the emitted hint.
        original: String,
        target: TargetType,
        aliased: String,
    },

    /// Hoistable conversion wrapper, public under the export's name.
    WrapperExport {
        name: String,
        target: TargetType,
        body: WrapperBody,
        must_hoist: bool,
    },

    /// A type declaration re-declared verbatim in this module.
    TypeDecl { name: String, target: TargetType },
}

/// Assemble the ordered unit list for one module.
///
/// `exports` carries each surviving export with its hoist decision;
/// `decls` the re-declarations in first-use order, already deduplicated
/// per (module, type-name).
pub fn assemble(
    compiled_path: &str,
    exports: &[(SynthesizedExport, bool)],
    decls: Vec<(String, TargetType)>,
) -> Vec<EmissionUnit> {
    let mut units = Vec::new();

    for (export, _) in exports {
        units.push(EmissionUnit::Import {
            item: export.name.clone(),
            alias: export.not_checked.clone(),
            from: compiled_path.to_string(),
        });
    }

    for (export, must_hoist) in exports {
        units.push(EmissionUnit::CheckedBinding {
            name: export.checked.clone(),
            original: export.name.clone(),
            target: export.target.clone(),
            aliased: export.not_checked.clone(),
        });
        if export.state == ExportState::Wrapped {
            if let Some(body) = &export.wrapper {
                units.push(EmissionUnit::WrapperExport {
                    name: export.name.clone(),
                    target: export.target.clone(),
                    body: body.clone(),
                    must_hoist: *must_hoist,
                });
            }
        }
    }

    for (name, target) in decls {
        units.push(EmissionUnit::TypeDecl { name, target });
    }

    units
}
