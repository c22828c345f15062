//! TypeScript emission
//!
//! Renders a module's emission units to text. Layout only: every ordering
//! and typing decision was made upstream, this file just spells it.

use crate::emit::EmissionUnit;
use crate::error::CodegenError;
use crate::ModuleOutput;
use std::fmt::Write;
use tsbind_core::TargetType;

pub struct TypeScriptEmitter {
    indent_size: usize,
}

impl Default for TypeScriptEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeScriptEmitter {
    pub fn new() -> Self {
        Self { indent_size: 2 }
    }

    pub fn render(&self, output: &ModuleOutput) -> Result<String, CodegenError> {
        let mut out = String::new();
        writeln!(out, "/* TypeScript file generated by tsbind. */")?;
        writeln!(out, "/* eslint-disable import/first */")?;
        writeln!(out)?;

        for unit in &output.units {
            writeln!(out)?;
            self.render_unit(&mut out, output, unit)?;
        }

        Ok(out)
    }

    fn render_unit(
        &self,
        out: &mut String,
        output: &ModuleOutput,
        unit: &EmissionUnit,
    ) -> Result<(), CodegenError> {
        match unit {
            EmissionUnit::Import { item, alias, from } => {
                writeln!(out, "import {{{} as {}}} from '{}';", item, alias, from)?;
            }

            EmissionUnit::CheckedBinding {
                name,
                original,
                target,
                aliased,
            } => {
                writeln!(
                    out,
                    "// In case of type error, check the type of '{}' in '{}' and '{}'.",
                    original, output.module, output.compiled_path
                )?;
                writeln!(
                    out,
                    "export const {}: {} = {};",
                    name,
                    self.ts_type(target),
                    aliased
                )?;
            }

            EmissionUnit::WrapperExport {
                name,
                target,
                body,
                must_hoist,
            } => {
                if *must_hoist {
                    writeln!(
                        out,
                        "// Export '{}' early to allow circular import from the compiled module.",
                        name
                    )?;
                }
                let ty = self.ts_type(target);
                if body.is_function {
                    let params = body
                        .params
                        .iter()
                        .map(|p| format!("{}: any", p))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(out, "export const {}: unknown = function ({}) {{", name, params)?;
                    writeln!(
                        out,
                        "{}const result = {};",
                        self.indent(1),
                        body.delegate_expr
                    )?;
                    writeln!(out, "{}return result", self.indent(1))?;
                    writeln!(out, "}} as {};", ty)?;
                } else {
                    writeln!(
                        out,
                        "export const {}: unknown = {} as {};",
                        name, body.delegate_expr, ty
                    )?;
                }
            }

            EmissionUnit::TypeDecl { name, target } => {
                writeln!(out, "// tslint:disable-next-line:interface-over-type-literal")?;
                writeln!(out, "export type {} = {};", name, self.ts_type(target))?;
            }
        }
        Ok(())
    }

    /// Spell a target type in TypeScript syntax.
    pub fn ts_type(&self, target: &TargetType) -> String {
        match target {
            TargetType::Primitive { primitive } => primitive.ts_name().to_string(),

            TargetType::Object { fields } => {
                if fields.is_empty() {
                    return "{}".to_string();
                }
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("readonly {}: {}", name, self.ts_type(ty)))
                    .collect();
                format!("{{ {} }}", rendered.join("; "))
            }

            TargetType::Tuple { elements } => {
                let rendered: Vec<String> =
                    elements.iter().map(|e| self.ts_type(e)).collect();
                format!("[{}]", rendered.join(", "))
            }

            TargetType::Function { params, ret } => {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|(name, ty)| format!("{}:{}", name, self.ts_type(ty)))
                    .collect();
                format!("({}) => {}", rendered.join(", "), self.ts_type(ret))
            }

            TargetType::Ref { name } => name.clone(),
        }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_size * level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::WrapperBody;
    use pretty_assertions::assert_eq;
    use tsbind_core::Primitive;

    fn emitter() -> TypeScriptEmitter {
        TypeScriptEmitter::new()
    }

    fn person_object() -> TargetType {
        TargetType::Object {
            fields: vec![
                ("name".to_string(), TargetType::primitive(Primitive::String)),
                ("age".to_string(), TargetType::primitive(Primitive::Int)),
            ],
        }
    }

    #[test]
    fn type_spelling() {
        let e = emitter();
        assert_eq!(
            e.ts_type(&person_object()),
            "{ readonly name: string; readonly age: number }"
        );
        assert_eq!(
            e.ts_type(&TargetType::Tuple {
                elements: vec![
                    TargetType::primitive(Primitive::String),
                    TargetType::primitive(Primitive::Int),
                ]
            }),
            "[string, number]"
        );
        let f = TargetType::Function {
            params: vec![(
                "_1".to_string(),
                TargetType::Object {
                    fields: vec![(
                        "person".to_string(),
                        TargetType::Ref {
                            name: "person".into(),
                        },
                    )],
                },
            )],
            ret: Box::new(TargetType::primitive(Primitive::String)),
        };
        assert_eq!(e.ts_type(&f), "(_1:{ readonly person: person }) => string");
    }

    #[test]
    fn renders_a_full_wrapped_module() {
        let target = TargetType::Function {
            params: vec![(
                "_1".to_string(),
                TargetType::Object {
                    fields: vec![(
                        "person".to_string(),
                        TargetType::Ref {
                            name: "person".into(),
                        },
                    )],
                },
            )],
            ret: Box::new(TargetType::primitive(Primitive::String)),
        };
        let output = ModuleOutput {
            module: "Hooks".into(),
            compiled_path: "./Hooks.bs".into(),
            units: vec![
                EmissionUnit::Import {
                    item: "foo".into(),
                    alias: "fooNotChecked".into(),
                    from: "./Hooks.bs".into(),
                },
                EmissionUnit::CheckedBinding {
                    name: "fooTypeChecked".into(),
                    original: "foo".into(),
                    target: target.clone(),
                    aliased: "fooNotChecked".into(),
                },
                EmissionUnit::WrapperExport {
                    name: "foo".into(),
                    target,
                    body: WrapperBody {
                        params: vec!["Argperson".into()],
                        delegate_expr:
                            "fooTypeChecked({person:{name:Argperson[0], age:Argperson[1]}})"
                                .into(),
                        is_function: true,
                    },
                    must_hoist: true,
                },
                EmissionUnit::TypeDecl {
                    name: "person".into(),
                    target: person_object(),
                },
            ],
            diagnostics: vec![],
        };

        let rendered = emitter().render(&output).unwrap();
        let expected = "\
/* TypeScript file generated by tsbind. */
/* eslint-disable import/first */


import {foo as fooNotChecked} from './Hooks.bs';

// In case of type error, check the type of 'foo' in 'Hooks' and './Hooks.bs'.
export const fooTypeChecked: (_1:{ readonly person: person }) => string = fooNotChecked;

// Export 'foo' early to allow circular import from the compiled module.
export const foo: unknown = function (Argperson: any) {
  const result = fooTypeChecked({person:{name:Argperson[0], age:Argperson[1]}});
  return result
} as (_1:{ readonly person: person }) => string;

// tslint:disable-next-line:interface-over-type-literal
export type person = { readonly name: string; readonly age: number };
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn value_wrapper_renders_as_converted_constant() {
        let output = ModuleOutput {
            module: "M".into(),
            compiled_path: "./M.bs".into(),
            units: vec![EmissionUnit::WrapperExport {
                name: "zero".into(),
                target: TargetType::Ref {
                    name: "person".into(),
                },
                body: WrapperBody {
                    params: vec![],
                    delegate_expr: "{name:zeroTypeChecked[0], age:zeroTypeChecked[1]}".into(),
                    is_function: false,
                },
                must_hoist: false,
            }],
            diagnostics: vec![],
        };
        let rendered = emitter().render(&output).unwrap();
        assert!(rendered.contains(
            "export const zero: unknown = {name:zeroTypeChecked[0], age:zeroTypeChecked[1]} as person;"
        ));
        assert!(!rendered.contains("early"));
    }
}
