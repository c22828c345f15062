//! Runtime conversion plans
//!
//! A `ConversionPlan` describes the transformation that turns a value in
//! the compiled module's representation into one satisfying its
//! `TargetType`. Plans are derived from types alone, never from values,
//! and are recomputed on every run.
//!
//! Besides driving wrapper emission, a plan over plain data can be applied
//! directly to a `serde_json::Value`; the test suite uses this to assert
//! that the conversion an emitted wrapper performs is total and
//! order-preserving.

use serde_json::Value;
use thiserror::Error;

/// Conversion for one named record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub name: String,
    pub plan: ConversionPlan,
}

/// Conversion for one function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamPlan {
    pub label: Option<String>,
    pub plan: ConversionPlan,
}

/// The derived runtime transformation for one type.
///
/// `Elements`, `Fields` and `Args` are the compound family: the value's
/// own shape is unchanged but some part nested inside it converts.
/// Constructors normalize — a compound whose children are all identity
/// collapses to `Identity`, so `plan != Identity` is exactly "a wrapper
/// is needed".
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionPlan {
    Identity,

    /// Positional record: build an object assigning field i the
    /// positional element i, in declared order.
    TupleToRecord { fields: Vec<FieldPlan> },

    /// Inverse direction, kept for completeness of the plan algebra.
    RecordToTuple { fields: Vec<FieldPlan> },

    /// Curried function: unpack the combined argument list into
    /// sequential single-argument calls, in parameter order.
    Uncurry { params: Vec<ParamPlan> },

    /// Tuple whose elements convert in place.
    Elements { elements: Vec<ConversionPlan> },

    /// Field-keyed record whose field values convert in place.
    Fields { fields: Vec<FieldPlan> },

    /// Uncurried function whose arguments convert before the single
    /// delegate call. `bundle` is set when the parameters are labeled and
    /// must be gathered into one combined object argument.
    Args { params: Vec<ParamPlan>, bundle: bool },
}

impl ConversionPlan {
    pub fn is_identity(&self) -> bool {
        matches!(self, ConversionPlan::Identity)
    }

    /// Compound plan over tuple elements; collapses when nothing inside
    /// converts.
    pub fn elements(elements: Vec<ConversionPlan>) -> Self {
        if elements.iter().all(|p| p.is_identity()) {
            ConversionPlan::Identity
        } else {
            ConversionPlan::Elements { elements }
        }
    }

    /// Compound plan over the fields of a field-keyed record.
    pub fn fields(fields: Vec<FieldPlan>) -> Self {
        if fields.iter().all(|f| f.plan.is_identity()) {
            ConversionPlan::Identity
        } else {
            ConversionPlan::Fields { fields }
        }
    }

    /// Plan for an uncurried function's arguments. Bundled (labeled)
    /// parameter lists always need a wrapper: the compiled form passes
    /// them positionally while the host type takes one object.
    pub fn args(params: Vec<ParamPlan>, bundle: bool) -> Self {
        if !bundle && params.iter().all(|p| p.plan.is_identity()) {
            ConversionPlan::Identity
        } else {
            ConversionPlan::Args { params, bundle }
        }
    }

    /// Apply this plan to a runtime value.
    ///
    /// Only data plans are applicable; function conversions exist solely
    /// as emitted wrapper code.
    pub fn apply(&self, value: &Value) -> Result<Value, PlanApplyError> {
        match self {
            ConversionPlan::Identity => Ok(value.clone()),

            ConversionPlan::TupleToRecord { fields } => {
                let elements = as_array(value, fields.len())?;
                let mut object = serde_json::Map::new();
                for (field, element) in fields.iter().zip(elements) {
                    object.insert(field.name.clone(), field.plan.apply(element)?);
                }
                Ok(Value::Object(object))
            }

            ConversionPlan::RecordToTuple { fields } => {
                let Value::Object(object) = value else {
                    return Err(PlanApplyError::ShapeMismatch {
                        expected: "object".into(),
                        got: kind_of(value),
                    });
                };
                let mut elements = Vec::with_capacity(fields.len());
                for field in fields {
                    let inner = object
                        .get(&field.name)
                        .ok_or_else(|| PlanApplyError::MissingField(field.name.clone()))?;
                    elements.push(field.plan.apply(inner)?);
                }
                Ok(Value::Array(elements))
            }

            ConversionPlan::Elements { elements: plans } => {
                let elements = as_array(value, plans.len())?;
                let converted = plans
                    .iter()
                    .zip(elements)
                    .map(|(plan, element)| plan.apply(element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(converted))
            }

            ConversionPlan::Fields { fields } => {
                let Value::Object(object) = value else {
                    return Err(PlanApplyError::ShapeMismatch {
                        expected: "object".into(),
                        got: kind_of(value),
                    });
                };
                let mut converted = object.clone();
                for field in fields {
                    let inner = object
                        .get(&field.name)
                        .ok_or_else(|| PlanApplyError::MissingField(field.name.clone()))?;
                    converted.insert(field.name.clone(), field.plan.apply(inner)?);
                }
                Ok(Value::Object(converted))
            }

            ConversionPlan::Uncurry { .. } | ConversionPlan::Args { .. } => {
                Err(PlanApplyError::NotData)
            }
        }
    }
}

fn as_array(value: &Value, expected_len: usize) -> Result<&Vec<Value>, PlanApplyError> {
    match value {
        Value::Array(elements) if elements.len() == expected_len => Ok(elements),
        Value::Array(elements) => Err(PlanApplyError::ShapeMismatch {
            expected: format!("array of length {}", expected_len),
            got: format!("array of length {}", elements.len()),
        }),
        other => Err(PlanApplyError::ShapeMismatch {
            expected: "array".into(),
            got: kind_of(other),
        }),
    }
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

#[derive(Error, Debug, PartialEq)]
pub enum PlanApplyError {
    #[error("value shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("function conversions cannot be applied to a value")]
    NotData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn field(name: &str) -> FieldPlan {
        FieldPlan {
            name: name.to_string(),
            plan: ConversionPlan::Identity,
        }
    }

    #[test]
    fn tuple_to_record_assigns_fields_in_declared_order() {
        let plan = ConversionPlan::TupleToRecord {
            fields: vec![field("name"), field("age")],
        };
        let converted = plan.apply(&json!(["Alice", 30])).unwrap();
        assert_eq!(converted, json!({"name": "Alice", "age": 30}));
    }

    #[test]
    fn record_to_tuple_reads_fields_in_declared_order() {
        let plan = ConversionPlan::RecordToTuple {
            fields: vec![field("name"), field("age")],
        };
        let converted = plan.apply(&json!({"age": 30, "name": "Alice"})).unwrap();
        assert_eq!(converted, json!(["Alice", 30]));
    }

    #[test]
    fn nested_field_conversion_wraps_the_fields_own_plan() {
        // record { person: positional record, children: string }
        let plan = ConversionPlan::Fields {
            fields: vec![
                FieldPlan {
                    name: "person".into(),
                    plan: ConversionPlan::TupleToRecord {
                        fields: vec![field("name"), field("age")],
                    },
                },
                field("children"),
            ],
        };
        let converted = plan
            .apply(&json!({"person": ["Alice", 30], "children": "x"}))
            .unwrap();
        assert_eq!(
            converted,
            json!({"person": {"name": "Alice", "age": 30}, "children": "x"})
        );
    }

    #[test]
    fn all_identity_compounds_normalize_away() {
        assert!(ConversionPlan::elements(vec![ConversionPlan::Identity; 3]).is_identity());
        assert!(ConversionPlan::fields(vec![field("a"), field("b")]).is_identity());
        assert!(ConversionPlan::args(
            vec![ParamPlan {
                label: None,
                plan: ConversionPlan::Identity
            }],
            false
        )
        .is_identity());
    }

    #[test]
    fn bundled_args_never_normalize_away() {
        let plan = ConversionPlan::args(
            vec![ParamPlan {
                label: Some("person".into()),
                plan: ConversionPlan::Identity,
            }],
            true,
        );
        assert!(!plan.is_identity());
    }

    #[test]
    fn length_mismatch_is_reported_not_truncated() {
        let plan = ConversionPlan::TupleToRecord {
            fields: vec![field("name"), field("age")],
        };
        let err = plan.apply(&json!(["Alice"])).unwrap_err();
        assert!(matches!(err, PlanApplyError::ShapeMismatch { .. }));
    }

    #[test]
    fn function_plans_are_not_value_applicable() {
        let plan = ConversionPlan::Uncurry { params: vec![] };
        assert_eq!(plan.apply(&json!(1)).unwrap_err(), PlanApplyError::NotData);
    }

    proptest! {
        // Every field i of the converted object equals element i of the
        // input tuple: conversion neither drops, duplicates nor reorders.
        #[test]
        fn tuple_to_record_preserves_order(values in proptest::collection::vec(any::<i64>(), 1..8)) {
            let fields: Vec<FieldPlan> =
                (0..values.len()).map(|i| field(&format!("f{}", i))).collect();
            let plan = ConversionPlan::TupleToRecord { fields };

            let tuple = Value::Array(values.iter().map(|v| json!(v)).collect());
            let converted = plan.apply(&tuple).unwrap();

            let object = converted.as_object().unwrap();
            prop_assert_eq!(object.len(), values.len());
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(object.get(&format!("f{}", i)).unwrap(), &json!(v));
            }
        }
    }
}
