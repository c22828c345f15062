//! Error types and per-run diagnostics for the generator
//!
//! Module-scope failures are `CodegenError`: they abort exactly one
//! module's generation. Everything recoverable (a skipped export, a
//! skipped declaration, an unconverted return type) becomes a
//! `Diagnostic` collected in a `DiagnosticSink` so nothing is ever
//! dropped silently.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("conflicting redeclarations of type '{name}' required by module '{module}'")]
    RedeclarationConflict { module: String, name: String },

    #[error("export '{export}' in module '{module}' cannot be hoisted: {reason}")]
    CycleUnresolvable {
        module: String,
        export: String,
        reason: String,
    },

    #[error("code generation error: {0}")]
    Generation(String),

    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What went wrong, for grouping in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A SourceType variant with no mapping rule.
    UnsupportedType,
    /// A named reference the collector never declared.
    UnknownType,
    /// A return type that would need a conversion wrappers do not perform.
    UnconvertedReturn,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnsupportedType => write!(f, "UNSUPPORTED_TYPE"),
            DiagnosticKind::UnknownType => write!(f, "UNKNOWN_TYPE"),
            DiagnosticKind::UnconvertedReturn => write!(f, "UNCONVERTED_RETURN"),
        }
    }
}

/// A diagnostic attached to a specific export or type in a module.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub module: String,
    /// The export this concerns, when it concerns one.
    pub export: Option<String>,
    /// The type declaration this concerns, when it concerns one.
    pub type_name: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn skipped_export(
        kind: DiagnosticKind,
        module: &str,
        export: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            module: module.to_string(),
            export: Some(export.to_string()),
            type_name: None,
            message: message.into(),
        }
    }

    pub fn skipped_type(
        kind: DiagnosticKind,
        module: &str,
        type_name: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            module: module.to_string(),
            export: None,
            type_name: Some(type_name.to_string()),
            message: message.into(),
        }
    }

    pub fn warning(
        kind: DiagnosticKind,
        module: &str,
        export: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            module: module.to_string(),
            export: Some(export.to_string()),
            type_name: None,
            message: message.into(),
        }
    }

    pub fn type_warning(
        kind: DiagnosticKind,
        module: &str,
        type_name: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            module: module.to_string(),
            export: None,
            type_name: Some(type_name.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.kind, self.module)?;
        if let Some(ref export) = self.export {
            write!(f, "::{}", export)?;
        }
        if let Some(ref type_name) = self.type_name {
            write!(f, " type '{}'", type_name)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Accumulates diagnostics during a module's generation instead of
/// failing on the first recoverable problem.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "diagnostic recorded");
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn format_summary(&self) -> String {
        if self.entries.is_empty() {
            return "no diagnostics".to_string();
        }
        let mut lines = vec![format!("{} diagnostic(s):", self.entries.len())];
        for entry in &self.entries {
            lines.push(format!("  - {}", entry));
        }
        lines.join("\n")
    }
}
