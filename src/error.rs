//! Error types for the pack orchestrator.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// PackError
// ============================================================================

/// Errors that abort a compile-and-emit run.
///
/// User-code diagnostics are deliberately NOT part of this enum: a syntax
/// error inside a tracked source is logged and the run still emits whatever
/// artifacts remain valid. Only collaborator failures abort a run.
#[derive(Debug, Error)]
pub enum PackError {
    /// The external compiler could not be configured (entry set, cache
    /// handles, resolution roots). Fatal: no run is attempted.
    #[error("compiler configuration failed: {0}")]
    Configure(anyhow::Error),

    /// The compile step itself failed (I/O or internal compiler exception).
    /// Committed cache state is left for the next run to correct.
    #[error("compilation failed: {0}")]
    Compile(anyhow::Error),

    /// Publishing an artifact to the host's sink failed.
    #[error("failed to publish artifact `{}`: {}", .0.display(), .1)]
    Artifact(PathBuf, anyhow::Error),

    /// An entry pattern did not parse.
    #[error("invalid entry pattern `{0}`")]
    Pattern(String, #[source] glob::PatternError),
}

// ============================================================================
// Diagnostic
// ============================================================================

/// A single user-code diagnostic reported by the compiler
/// (syntax error, unresolved import, ...).
///
/// Logged individually; never aborts the run.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Error description as the compiler rendered it.
    pub message: String,
    /// Offending source file, when the compiler could attribute one.
    pub file: Option<PathBuf>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
