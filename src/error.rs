//! Process-level errors.
//!
//! Per-image problems never surface here; they are recorded as
//! `domain::ConversionFailure` / `domain::MissingSource` and the run carries on.
//! `AppError` is reserved for things that stop the whole command.

use std::path::Path;

/// Exit code for bad input (CLI flags, catalog manifests, unreadable directories).
pub const EXIT_INPUT: u8 = 2;
/// Exit code for a verification pass that found problems.
pub const EXIT_VERIFY: u8 = 3;

#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Shorthand for an input error tied to a path.
    pub fn input(what: &str, path: &Path, err: impl std::fmt::Display) -> Self {
        Self::new(EXIT_INPUT, format!("{what} '{}': {err}", path.display()))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}
