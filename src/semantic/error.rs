use thiserror::Error;

use crate::source_manager::SourceLoc;

/// Fatal conditions raised while synthesizing implicit declarations.
///
/// Every variant aborts the pass. User-facing variants describe a program
/// that violates a program-level rule; internal variants mean an earlier pass
/// handed over a malformed tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("main multiply defined -- first occurrence at {first_described}")]
    MainMultiplyDefined {
        location: SourceLoc,
        first: SourceLoc,
        first_described: String,
    },

    #[error("Code defines multiple modules but no main function.")]
    MultipleModulesNoMain { location: SourceLoc },

    #[error("Program defines no user module to hold a main function.")]
    NoUserModule { location: SourceLoc },

    // --- internal ---
    #[error("main function '{name}' is not defined at module scope")]
    MainNotInModule { name: String, location: SourceLoc },

    #[error("main function is defined in non-user module '{module}'")]
    MainInNonUserModule { module: String, location: SourceLoc },

    #[error("{which} module is not registered")]
    MissingModule { which: &'static str, location: SourceLoc },

    #[error("'{name}' has no defining statement")]
    MissingDefinition { name: String, location: SourceLoc },

    #[error("stream type '{name}' is not defined in the prelude")]
    MissingStreamType { name: String, location: SourceLoc },

    #[error("argument order for '{name}' is not a permutation of {expected} formals")]
    InvalidArgumentOrder {
        name: String,
        expected: usize,
        location: SourceLoc,
    },

    #[error("'{name}' has no formal numbered {index}")]
    UnknownFormal {
        name: String,
        index: usize,
        location: SourceLoc,
    },
}

impl SynthesisError {
    /// Internal errors point at a defect in an earlier pass, not in user code.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            SynthesisError::MainMultiplyDefined { .. }
                | SynthesisError::MultipleModulesNoMain { .. }
                | SynthesisError::NoUserModule { .. }
        )
    }

    pub fn location(&self) -> SourceLoc {
        match self {
            SynthesisError::MainMultiplyDefined { location, .. } => *location,
            SynthesisError::MultipleModulesNoMain { location } => *location,
            SynthesisError::NoUserModule { location } => *location,
            SynthesisError::MainNotInModule { location, .. } => *location,
            SynthesisError::MainInNonUserModule { location, .. } => *location,
            SynthesisError::MissingModule { location, .. } => *location,
            SynthesisError::MissingDefinition { location, .. } => *location,
            SynthesisError::MissingStreamType { location, .. } => *location,
            SynthesisError::InvalidArgumentOrder { location, .. } => *location,
            SynthesisError::UnknownFormal { location, .. } => *location,
        }
    }

    /// Secondary location worth pointing at, such as a first definition.
    pub fn related(&self) -> Option<SourceLoc> {
        match self {
            SynthesisError::MainMultiplyDefined { first, .. } => Some(*first),
            _ => None,
        }
    }
}
