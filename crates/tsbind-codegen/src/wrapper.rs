//! Wrapper Synthesizer
//!
//! For every exported value this produces exactly one checked binding (a
//! precisely-typed alias of the raw import that exists to trigger static
//! verification) and, when the conversion plan is not identity, one wrapper
//! export whose body converts its inputs and delegates to the checked
//! binding. Identity exports re-export the checked binding directly.

use crate::error::CodegenError;
use crate::mapper::Mapped;
use crate::plan::{ConversionPlan, ParamPlan};
use tracing::debug;
use tsbind_core::naming;
use tsbind_core::TargetType;

/// The two states an export can be in, decided solely by its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    /// The checked binding is the public export.
    Direct,
    /// Checked binding plus a separate conversion wrapper.
    Wrapped,
}

/// Body of a wrapper export.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperBody {
    /// Literal parameter names of the wrapper; empty for value exports.
    pub params: Vec<String>,
    /// The conversion-then-delegate expression. For functions this is the
    /// delegate call; for values it is the converted-constant initializer.
    pub delegate_expr: String,
    pub is_function: bool,
}

/// Everything emission needs to know about one export.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedExport {
    pub name: String,
    pub target: TargetType,
    pub state: ExportState,
    /// Alias under which the unconverted value is imported.
    pub not_checked: String,
    /// Name of the checked binding. Equals `name` for direct exports.
    pub checked: String,
    pub wrapper: Option<WrapperBody>,
}

/// Synthesize the bindings for one export from its mapping result.
pub fn synthesize(name: &str, mapped: &Mapped) -> Result<SynthesizedExport, CodegenError> {
    let not_checked = naming::not_checked(name);

    if mapped.plan.is_identity() {
        debug!(export = name, "direct re-export, no conversion");
        return Ok(SynthesizedExport {
            name: name.to_string(),
            target: mapped.target.clone(),
            state: ExportState::Direct,
            not_checked,
            checked: name.to_string(),
            wrapper: None,
        });
    }

    let checked = naming::type_checked(name);
    let body = match &mapped.plan {
        ConversionPlan::Uncurry { params } => uncurried_body(&checked, params)?,
        ConversionPlan::Args { params, bundle } => args_body(&checked, params, *bundle)?,
        data_plan => WrapperBody {
            params: Vec::new(),
            delegate_expr: convert_expr(data_plan, &checked)?,
            is_function: false,
        },
    };

    debug!(export = name, is_function = body.is_function, "wrapped export");

    Ok(SynthesizedExport {
        name: name.to_string(),
        target: mapped.target.clone(),
        state: ExportState::Wrapped,
        not_checked,
        checked,
        wrapper: Some(body),
    })
}

/// Curried source function: the wrapper makes sequential single-argument
/// calls on the checked binding, in parameter order.
fn uncurried_body(checked: &str, params: &[ParamPlan]) -> Result<WrapperBody, CodegenError> {
    let labeled = params.iter().any(|p| p.label.is_some());

    let (wrapper_params, arg_exprs): (Vec<String>, Vec<String>) = if labeled {
        // One combined argument object; unpack its named fields.
        let arg = naming::arg_name(None, 0);
        let exprs = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let field = p
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("_{}", i + 1));
                convert_expr(&p.plan, &format!("{}.{}", arg, field))
            })
            .collect::<Result<Vec<_>, _>>()?;
        (vec![arg], exprs)
    } else {
        let names: Vec<String> = (0..params.len()).map(|i| naming::arg_name(None, i)).collect();
        let exprs = params
            .iter()
            .zip(&names)
            .map(|(p, name)| convert_expr(&p.plan, name))
            .collect::<Result<Vec<_>, _>>()?;
        (names, exprs)
    };

    let mut call = checked.to_string();
    for expr in &arg_exprs {
        call.push('(');
        call.push_str(expr);
        call.push(')');
    }

    Ok(WrapperBody {
        params: wrapper_params,
        delegate_expr: call,
        is_function: true,
    })
}

/// Uncurried source function: one delegate call, with the positional
/// inputs bundled into a combined object when the parameters are labeled.
fn args_body(
    checked: &str,
    params: &[ParamPlan],
    bundle: bool,
) -> Result<WrapperBody, CodegenError> {
    let names: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, p)| naming::arg_name(p.label.as_deref(), i))
        .collect();

    let delegate_expr = if bundle {
        let fields = params
            .iter()
            .zip(&names)
            .enumerate()
            .map(|(i, (p, name))| {
                let key = p.label.clone().unwrap_or_else(|| format!("_{}", i + 1));
                Ok(format!("{}:{}", key, convert_expr(&p.plan, name)?))
            })
            .collect::<Result<Vec<String>, CodegenError>>()?;
        format!("{}({{{}}})", checked, fields.join(", "))
    } else {
        let args = params
            .iter()
            .zip(&names)
            .map(|(p, name)| convert_expr(&p.plan, name))
            .collect::<Result<Vec<String>, _>>()?;
        format!("{}({})", checked, args.join(", "))
    };

    Ok(WrapperBody {
        params: names,
        delegate_expr,
        is_function: true,
    })
}

/// Build the expression converting `input` according to `plan`.
///
/// Total over data plans. The mapper rejects function conversions in
/// value position before synthesis; reaching one here is a generation
/// error, never a silent passthrough.
fn convert_expr(plan: &ConversionPlan, input: &str) -> Result<String, CodegenError> {
    Ok(match plan {
        ConversionPlan::Identity => input.to_string(),

        ConversionPlan::TupleToRecord { fields } => {
            let assignments = fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    Ok(format!(
                        "{}:{}",
                        f.name,
                        convert_expr(&f.plan, &format!("{}[{}]", input, i))?
                    ))
                })
                .collect::<Result<Vec<String>, CodegenError>>()?;
            format!("{{{}}}", assignments.join(", "))
        }

        ConversionPlan::RecordToTuple { fields } => {
            let elements = fields
                .iter()
                .map(|f| convert_expr(&f.plan, &format!("{}.{}", input, f.name)))
                .collect::<Result<Vec<String>, _>>()?;
            format!("[{}]", elements.join(", "))
        }

        ConversionPlan::Elements { elements } => {
            let converted = elements
                .iter()
                .enumerate()
                .map(|(i, p)| convert_expr(p, &format!("{}[{}]", input, i)))
                .collect::<Result<Vec<String>, _>>()?;
            format!("[{}]", converted.join(", "))
        }

        ConversionPlan::Fields { fields } => {
            let assignments = fields
                .iter()
                .map(|f| {
                    Ok(format!(
                        "{}:{}",
                        f.name,
                        convert_expr(&f.plan, &format!("{}.{}", input, f.name))?
                    ))
                })
                .collect::<Result<Vec<String>, CodegenError>>()?;
            format!("{{{}}}", assignments.join(", "))
        }

        ConversionPlan::Uncurry { .. } | ConversionPlan::Args { .. } => {
            return Err(CodegenError::Generation(format!(
                "function conversion reached value position at '{}'",
                input
            )));
        }
    })
}
