//! Synthesis pipeline driver
//!
//! Runs the synthesis stage over a compilation context and turns its fatal
//! errors into diagnostics, the way the enclosing compiler runs every stage.

use log::{debug, info};

use crate::diagnostic::{DiagnosticEngine, ErrorFormatter};
use crate::semantic::{self, CompilationContext, DefaultIoProvider, SynthesisReport};
use crate::source_manager::SourceManager;

/// Error that will stop the compilation pipeline
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Compilation failed due to errors")]
    Fatal,
}

/// Main synthesis driver
#[derive(Debug, Default)]
pub struct SynthesisDriver {
    diagnostics: DiagnosticEngine,
}

impl SynthesisDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize the implicit declarations of the program in `ctx`.
    ///
    /// On failure the error is recorded as a diagnostic and nothing after the
    /// failing step runs.
    pub fn run(
        &mut self,
        ctx: &mut CompilationContext,
        io: &dyn DefaultIoProvider,
    ) -> Result<SynthesisReport, PipelineError> {
        debug!("SynthesisDriver: {} modules registered", ctx.modules.len());
        match semantic::build_default_functions(ctx, io) {
            Ok(report) => {
                info!(
                    "SynthesisDriver: synthesized {} declarations, entry point '{}'",
                    report.total(),
                    report.entry_point
                );
                Ok(report)
            }
            Err(e) => {
                self.diagnostics.report_error(&e);
                Err(PipelineError::Fatal)
            }
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    pub fn format_diagnostics(&self, source_manager: &SourceManager) -> String {
        ErrorFormatter::default().format_diagnostics(self.diagnostics.diagnostics(), source_manager)
    }

    pub fn print_diagnostics(&self, source_manager: &SourceManager) {
        let formatter = ErrorFormatter::default();
        formatter.print_diagnostics(self.diagnostics.diagnostics(), source_manager);
    }
}
