//! Error types for the CLI

use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Dotenv file could not be loaded
    #[error("cannot load {}: {source}", path.display())]
    EnvFile {
        /// File that was read
        path: PathBuf,
        /// Parse or read failure
        source: dotenvy::Error,
    },

    /// Browser could not be started
    #[error("Browser unavailable: {message}")]
    BrowserUnavailable {
        /// Error message
        message: String,
    },

    /// One or more scenarios failed
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed {
        /// Failed scenario count
        failed: usize,
        /// Scenarios run
        total: usize,
    },

    /// Run aborted by Ctrl-C
    #[error("Interrupted")]
    Interrupted,

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Page object library error
    #[error("{0}")]
    Pom(#[from] storefront_pom::PomError),
}

impl CliError {
    /// Create a browser unavailable error
    #[must_use]
    pub fn browser_unavailable(message: impl Into<String>) -> Self {
        Self::BrowserUnavailable {
            message: message.into(),
        }
    }
}
