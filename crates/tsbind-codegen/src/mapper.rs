//! Type Mapper
//!
//! Walks a `SourceType` and produces the host-side `TargetType` together
//! with the `ConversionPlan` fragment describing how the compiled runtime
//! representation reaches that shape. Named references resolve against the
//! run-wide declaration table and record which declarations must be
//! re-emitted in the current module.

use crate::plan::{ConversionPlan, FieldPlan, ParamPlan};
use thiserror::Error;
use tracing::{debug, trace};
use tsbind_core::{CoreError, DeclTable, Param, RecordRepr, SourceType, TargetType};

/// Result of mapping one source type.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped {
    pub target: TargetType,
    pub plan: ConversionPlan,
}

#[derive(Error, Debug)]
pub enum MapError {
    /// No mapping rule exists. Recovered per export: the engine skips the
    /// affected export, emits a diagnostic and continues.
    #[error("no mapping rule for abstract type '{0}'")]
    Unsupported(String),

    /// A named reference points at nothing the collector reported.
    /// Recovered per export, like `Unsupported`.
    #[error("type '{0}' not found in any module's declarations")]
    UnknownType(String),

    /// A recursive declaration whose conversion would have to recurse
    /// with it. No recursive converter is emitted, so a plan for it
    /// would convert only the outermost level. Recovered per export.
    #[error("recursive type '{0}' needs a conversion at every level")]
    RecursiveConversion(String),

    /// Structurally incompatible redeclarations are both required here.
    /// Module-scope: generation of this module aborts.
    #[error(transparent)]
    Conflict(#[from] CoreError),
}

impl MapError {
    /// Recoverable failures skip one export; the rest abort the module.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MapError::Conflict(_))
    }
}

/// Non-fatal observations made while mapping, reported as diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum MapWarning {
    /// A function's return type would need a conversion, but wrappers
    /// forward results unchanged.
    UnconvertedReturn { type_name: String },
}

pub struct TypeMapper<'a> {
    module: &'a str,
    decls: &'a DeclTable,
    /// Declarations the current module must re-emit, in first-use order.
    required: Vec<String>,
    /// Guard against recursive declarations.
    visiting: Vec<String>,
    /// Declarations whose mapping hit a back-edge onto themselves.
    back_edges: Vec<String>,
    warnings: Vec<MapWarning>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(module: &'a str, decls: &'a DeclTable) -> Self {
        Self {
            module,
            decls,
            required: Vec::new(),
            visiting: Vec::new(),
            back_edges: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Names of declarations that must be re-declared in this module,
    /// transitively, in first-use order.
    pub fn required_decls(&self) -> &[String] {
        &self.required
    }

    pub fn take_warnings(&mut self) -> Vec<MapWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn map(&mut self, ty: &SourceType) -> Result<Mapped, MapError> {
        match ty {
            SourceType::Primitive { primitive } => Ok(Mapped {
                target: TargetType::Primitive {
                    primitive: *primitive,
                },
                plan: ConversionPlan::Identity,
            }),

            SourceType::Record { fields, repr } => {
                let mut target_fields = Vec::with_capacity(fields.len());
                let mut field_plans = Vec::with_capacity(fields.len());
                for field in fields {
                    let mapped = self.map(&field.ty)?;
                    reject_nested_function_plan(&mapped.plan, &field.name)?;
                    target_fields.push((field.name.clone(), mapped.target));
                    field_plans.push(FieldPlan {
                        name: field.name.clone(),
                        plan: mapped.plan,
                    });
                }
                let target = TargetType::Object {
                    fields: target_fields,
                };
                let plan = match repr {
                    // Already keyed by field name at runtime: identity,
                    // modulo conversions nested in the field values.
                    RecordRepr::FieldKeyed => ConversionPlan::fields(field_plans),
                    RecordRepr::Positional => {
                        ConversionPlan::TupleToRecord {
                            fields: field_plans,
                        }
                    }
                };
                trace!(module = self.module, ?repr, identity = plan.is_identity(), "mapped record");
                Ok(Mapped { target, plan })
            }

            SourceType::Tuple { elements } => {
                let mut target_elements = Vec::with_capacity(elements.len());
                let mut element_plans = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let mapped = self.map(element)?;
                    reject_nested_function_plan(&mapped.plan, &format!("element {}", i))?;
                    target_elements.push(mapped.target);
                    element_plans.push(mapped.plan);
                }
                Ok(Mapped {
                    target: TargetType::Tuple {
                        elements: target_elements,
                    },
                    plan: ConversionPlan::elements(element_plans),
                })
            }

            SourceType::Function {
                params,
                curried,
                ret,
            } => self.map_function(params, *curried, ret),

            SourceType::Ref { name } => self.map_reference(name),

            SourceType::Abstract { name } => {
                debug!(module = self.module, type_name = name.as_str(), "unsupported abstract type");
                Err(MapError::Unsupported(name.clone()))
            }
        }
    }

    fn map_function(
        &mut self,
        params: &[Param],
        curried: bool,
        ret: &SourceType,
    ) -> Result<Mapped, MapError> {
        let mut param_plans = Vec::with_capacity(params.len());
        let mut param_targets = Vec::with_capacity(params.len());
        for param in params {
            let mapped = self.map(&param.ty)?;
            let position = param
                .label
                .clone()
                .unwrap_or_else(|| format!("parameter {}", param_plans.len() + 1));
            reject_nested_function_plan(&mapped.plan, &position)?;
            param_targets.push((param.label.clone(), mapped.target));
            param_plans.push(ParamPlan {
                label: param.label.clone(),
                plan: mapped.plan,
            });
        }

        let mapped_ret = self.map(ret)?;
        if !mapped_ret.plan.is_identity() {
            // Results are forwarded unchanged; make the gap visible.
            self.warnings.push(MapWarning::UnconvertedReturn {
                type_name: describe(ret),
            });
        }

        // Labeled parameters bundle into one combined object argument;
        // positional parameter lists stay positional.
        let bundle = params.iter().any(|p| p.label.is_some());
        let target_params = if bundle {
            let bundle_fields = param_targets
                .into_iter()
                .enumerate()
                .map(|(i, (label, target))| {
                    (label.unwrap_or_else(|| format!("_{}", i + 1)), target)
                })
                .collect();
            vec![(
                "_1".to_string(),
                TargetType::Object {
                    fields: bundle_fields,
                },
            )]
        } else {
            param_targets
                .into_iter()
                .enumerate()
                .map(|(i, (_, target))| (format!("_{}", i + 1), target))
                .collect()
        };

        let plan = if curried {
            ConversionPlan::Uncurry {
                params: param_plans,
            }
        } else {
            ConversionPlan::args(param_plans, bundle)
        };

        trace!(
            module = self.module,
            curried,
            bundle,
            identity = plan.is_identity(),
            "mapped function"
        );

        Ok(Mapped {
            target: TargetType::Function {
                params: target_params,
                ret: Box::new(mapped_ret.target),
            },
            plan,
        })
    }

    fn map_reference(&mut self, name: &str) -> Result<Mapped, MapError> {
        let decl_ty = self
            .decls
            .resolve(self.module, name)?
            .ok_or_else(|| MapError::UnknownType(name.to_string()))?
            .ty
            .clone();

        // Recursive declaration: the back-edge keeps the reference and
        // stands in as identity; whether that is sound is checked once
        // the declaration's own mapping completes below.
        if self.visiting.iter().any(|n| n == name) {
            trace!(module = self.module, type_name = name, "recursive reference");
            if !self.back_edges.iter().any(|n| n == name) {
                self.back_edges.push(name.to_string());
            }
            return Ok(Mapped {
                target: TargetType::Ref {
                    name: name.to_string(),
                },
                plan: ConversionPlan::Identity,
            });
        }

        self.visiting.push(name.to_string());
        let inner = self.map(&decl_ty);
        self.visiting.pop();
        let inner = inner?;

        // A recursive declaration needing any conversion would need that
        // conversion at every level, but the back-edge above contributed
        // identity: refuse rather than convert only the outermost level.
        if let Some(pos) = self.back_edges.iter().position(|n| n == name) {
            self.back_edges.remove(pos);
            if !inner.plan.is_identity() {
                debug!(
                    module = self.module,
                    type_name = name,
                    "recursive type needs a conversion"
                );
                return Err(MapError::RecursiveConversion(name.to_string()));
            }
        }

        if !self.required.iter().any(|n| n == name) {
            self.required.push(name.to_string());
        }

        debug!(
            module = self.module,
            type_name = name,
            identity = inner.plan.is_identity(),
            "resolved named reference"
        );

        // The reference's plan is inherited from the referenced type.
        Ok(Mapped {
            target: TargetType::Ref {
                name: name.to_string(),
            },
            plan: inner.plan,
        })
    }
}

/// Function conversions are only expressible at the export's own call
/// boundary; inside a record field, tuple element or parameter value they
/// would need an eta-expanded proxy, which has no mapping rule here.
fn reject_nested_function_plan(plan: &ConversionPlan, position: &str) -> Result<(), MapError> {
    match plan {
        ConversionPlan::Uncurry { .. } | ConversionPlan::Args { .. } => Err(MapError::Unsupported(
            format!("function needing conversion nested at {}", position),
        )),
        _ => Ok(()),
    }
}

fn describe(ty: &SourceType) -> String {
    match ty {
        SourceType::Primitive { primitive } => primitive.ts_name().to_string(),
        SourceType::Record { .. } => "record".to_string(),
        SourceType::Tuple { .. } => "tuple".to_string(),
        SourceType::Function { .. } => "function".to_string(),
        SourceType::Ref { name } => name.clone(),
        SourceType::Abstract { name } => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tsbind_core::{Primitive, ProjectBuilder, SourceType};

    fn person_ty(repr: RecordRepr) -> SourceType {
        SourceType::record(
            vec![
                ("name", SourceType::primitive(Primitive::String)),
                ("age", SourceType::primitive(Primitive::Int)),
            ],
            repr,
        )
    }

    fn empty_table() -> DeclTable {
        DeclTable::new()
    }

    #[test]
    fn primitives_are_identity() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let mapped = mapper.map(&SourceType::primitive(Primitive::Bool)).unwrap();
        assert!(mapped.plan.is_identity());
        assert_eq!(mapped.target, TargetType::primitive(Primitive::Bool));
    }

    #[test]
    fn field_keyed_record_is_identity() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let mapped = mapper.map(&person_ty(RecordRepr::FieldKeyed)).unwrap();
        assert!(mapped.plan.is_identity());
    }

    #[test]
    fn positional_record_needs_tuple_to_record() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let mapped = mapper.map(&person_ty(RecordRepr::Positional)).unwrap();
        match mapped.plan {
            ConversionPlan::TupleToRecord { fields } => {
                let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["name", "age"]);
            }
            other => panic!("expected TupleToRecord, got {:?}", other),
        }
    }

    #[test]
    fn reference_inherits_plan_and_is_required() {
        let project = ProjectBuilder::new()
            .module("M")
            .type_decl("person", person_ty(RecordRepr::Positional))
            .build();
        let table = DeclTable::from_project(&project);
        let mut mapper = TypeMapper::new("M", &table);

        let mapped = mapper.map(&SourceType::reference("person")).unwrap();
        assert_eq!(
            mapped.target,
            TargetType::Ref {
                name: "person".into()
            }
        );
        assert!(!mapped.plan.is_identity());
        assert_eq!(mapper.required_decls(), &["person".to_string()]);
    }

    #[test]
    fn transitive_references_are_all_required() {
        let project = ProjectBuilder::new()
            .module("M")
            .type_decl(
                "address",
                SourceType::record(
                    vec![("street", SourceType::primitive(Primitive::String))],
                    RecordRepr::FieldKeyed,
                ),
            )
            .type_decl(
                "person",
                SourceType::record(
                    vec![("home", SourceType::reference("address"))],
                    RecordRepr::FieldKeyed,
                ),
            )
            .build();
        let table = DeclTable::from_project(&project);
        let mut mapper = TypeMapper::new("M", &table);

        mapper.map(&SourceType::reference("person")).unwrap();
        assert_eq!(
            mapper.required_decls(),
            &["address".to_string(), "person".to_string()]
        );
    }

    #[test]
    fn recursive_declarations_terminate() {
        let project = ProjectBuilder::new()
            .module("M")
            .type_decl(
                "tree",
                SourceType::record(
                    vec![
                        ("value", SourceType::primitive(Primitive::Int)),
                        ("left", SourceType::reference("tree")),
                    ],
                    RecordRepr::FieldKeyed,
                ),
            )
            .build();
        let table = DeclTable::from_project(&project);
        let mut mapper = TypeMapper::new("M", &table);

        let mapped = mapper.map(&SourceType::reference("tree")).unwrap();
        assert_eq!(
            mapped.target,
            TargetType::Ref {
                name: "tree".into()
            }
        );
    }

    #[test]
    fn recursive_type_needing_conversion_is_rejected() {
        // list = positional record { value, next: list }: a plan for it
        // would convert only the outermost level, so none is produced.
        let project = ProjectBuilder::new()
            .module("M")
            .type_decl(
                "list",
                SourceType::record(
                    vec![
                        ("value", SourceType::primitive(Primitive::Int)),
                        ("next", SourceType::reference("list")),
                    ],
                    RecordRepr::Positional,
                ),
            )
            .build();
        let table = DeclTable::from_project(&project);
        let mut mapper = TypeMapper::new("M", &table);

        let err = mapper.map(&SourceType::reference("list")).unwrap_err();
        assert!(matches!(err, MapError::RecursiveConversion(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn recursion_inside_a_field_keyed_wrapper_is_still_rejected() {
        // The conversion sits on a nested field, but the cycle still
        // passes through 'tree', so its plan cannot be finite.
        let project = ProjectBuilder::new()
            .module("M")
            .type_decl(
                "tree",
                SourceType::record(
                    vec![
                        ("data", person_ty(RecordRepr::Positional)),
                        ("left", SourceType::reference("tree")),
                    ],
                    RecordRepr::FieldKeyed,
                ),
            )
            .build();
        let table = DeclTable::from_project(&project);
        let mut mapper = TypeMapper::new("M", &table);

        let err = mapper.map(&SourceType::reference("tree")).unwrap_err();
        assert!(matches!(err, MapError::RecursiveConversion(_)));
    }

    #[test]
    fn abstract_types_are_unsupported() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let err = mapper
            .map(&SourceType::Abstract {
                name: "Js.Dict.t".into(),
            })
            .unwrap_err();
        assert!(matches!(err, MapError::Unsupported(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn unknown_reference_is_recoverable() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let err = mapper.map(&SourceType::reference("ghost")).unwrap_err();
        assert!(matches!(err, MapError::UnknownType(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn labeled_params_bundle_into_one_object() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let ty = SourceType::Function {
            params: vec![Param::labeled(
                "person",
                person_ty(RecordRepr::FieldKeyed),
            )],
            curried: false,
            ret: Box::new(SourceType::primitive(Primitive::String)),
        };
        let mapped = mapper.map(&ty).unwrap();
        match &mapped.target {
            TargetType::Function { params, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].0, "_1");
                assert!(matches!(params[0].1, TargetType::Object { .. }));
            }
            other => panic!("expected function, got {:?}", other),
        }
        // Bundling itself is a conversion.
        assert!(!mapped.plan.is_identity());
    }

    #[test]
    fn positional_object_param_is_direct() {
        // A single-argument function whose sole parameter is already
        // object-shaped needs no conversion.
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let ty = SourceType::Function {
            params: vec![Param::positional(person_ty(RecordRepr::FieldKeyed))],
            curried: false,
            ret: Box::new(SourceType::primitive(Primitive::String)),
        };
        let mapped = mapper.map(&ty).unwrap();
        assert!(mapped.plan.is_identity());
    }

    #[test]
    fn curried_functions_uncurry() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let ty = SourceType::Function {
            params: vec![
                Param::positional(SourceType::primitive(Primitive::Int)),
                Param::positional(SourceType::primitive(Primitive::Int)),
            ],
            curried: true,
            ret: Box::new(SourceType::primitive(Primitive::Int)),
        };
        let mapped = mapper.map(&ty).unwrap();
        assert!(matches!(mapped.plan, ConversionPlan::Uncurry { .. }));
    }

    #[test]
    fn unconverted_return_is_warned() {
        let table = empty_table();
        let mut mapper = TypeMapper::new("M", &table);
        let ty = SourceType::Function {
            params: vec![Param::positional(SourceType::primitive(Primitive::Int))],
            curried: false,
            ret: Box::new(person_ty(RecordRepr::Positional)),
        };
        mapper.map(&ty).unwrap();
        assert_eq!(mapper.take_warnings().len(), 1);
    }
}
