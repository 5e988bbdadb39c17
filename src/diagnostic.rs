use crate::semantic::SynthesisError;
use crate::source_manager::{SourceLoc, SourceManager};

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    /// A compiler invariant broke; the program is not at fault.
    InternalError,
    Note,
}

/// Individual diagnostic with rich context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub location: SourceLoc,
    pub related: Vec<SourceLoc>, // Related locations
}

/// Diagnostic engine for collecting errors raised by the synthesis stage
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_error(&mut self, error: &SynthesisError) {
        let level = if error.is_internal() {
            DiagnosticLevel::InternalError
        } else {
            DiagnosticLevel::Error
        };
        let diag = Diagnostic {
            level,
            message: error.to_string(),
            location: error.location(),
            related: error.related().into_iter().collect(),
        };
        self.report_diagnostic(diag);
    }

    pub fn report_note(&mut self, message: String, location: SourceLoc) {
        let diag = Diagnostic {
            level: DiagnosticLevel::Note,
            message,
            location,
            related: Vec::new(),
        };
        self.report_diagnostic(diag);
    }

    pub fn report_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Error | DiagnosticLevel::InternalError))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Renders diagnostics as `level: message at file:line`.
pub struct ErrorFormatter {
    /// Also print a `note:` line for each related location.
    pub show_related: bool,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        ErrorFormatter { show_related: true }
    }
}

impl ErrorFormatter {
    /// Format a single diagnostic
    pub fn format_diagnostic(&self, diag: &Diagnostic, source_manager: &SourceManager) -> String {
        let level_str = match diag.level {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::InternalError => "internal compiler error",
            DiagnosticLevel::Note => "note",
        };

        let mut result = format!("{}: {}", level_str, diag.message);

        // built-in locations have no file worth naming
        if !diag.location.is_builtin() {
            result.push_str(&format!(" at {}", source_manager.describe(diag.location)));
        }

        if self.show_related {
            for related in &diag.related {
                result.push_str(&format!("\n  note: related location {}", source_manager.describe(*related)));
            }
        }

        result
    }

    /// Format multiple diagnostics
    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic], source_manager: &SourceManager) -> String {
        diagnostics
            .iter()
            .map(|diag| self.format_diagnostic(diag, source_manager))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic], source_manager: &SourceManager) {
        for diag in diagnostics {
            eprintln!("{}", self.format_diagnostic(diag, source_manager));
        }
    }
}
