//! Naming conventions for generated bindings.
//!
//! The generated file pairs every public export with two auxiliary names:
//! the raw import alias (`fooNotChecked`) and the precisely-typed alias
//! (`fooTypeChecked`). Wrapper parameters are named after the parameter
//! label (`Argperson`) or position (`Arg1`).

/// Alias under which the raw, unconverted value is imported.
pub fn not_checked(name: &str) -> String {
    format!("{}NotChecked", name)
}

/// Name of the precisely-typed alias that triggers static verification.
pub fn type_checked(name: &str) -> String {
    format!("{}TypeChecked", name)
}

/// Wrapper parameter name for a labeled or positional parameter.
/// Positions are 1-based to match the generated-output convention.
pub fn arg_name(label: Option<&str>, position: usize) -> String {
    match label {
        Some(label) => format!("Arg{}", label),
        None => format!("Arg{}", position + 1),
    }
}

/// Whether `name` can be emitted verbatim as a TypeScript identifier.
pub fn is_valid_ts_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') && !is_reserved_word(name)
}

// Words that cannot name a const binding. Contextual keywords like `type`
// or `async` are legal binding names and stay out of this list.
fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
    )
}
