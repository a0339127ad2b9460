//! Result and error types for storefront page objects.

use thiserror::Error;

/// Result type for page-object operations
pub type PomResult<T> = Result<T, PomError>;

/// Errors surfaced by page objects, the selector resolver and the poll helper.
///
/// Every error reaches the calling scenario immediately. The only retry in the
/// core is the poll helper re-reading a value, which uses
/// [`PomError::is_transient`] to decide whether a failed read is worth another
/// attempt.
#[derive(Debug, Error)]
pub enum PomError {
    /// No selector strategy matched within the action wait
    #[error("Could not resolve `{element}` after {timeout_ms}ms (tried {strategies:?})")]
    ResolutionFailure {
        /// Logical element name
        element: String,
        /// Strategies tried, in priority order
        strategies: Vec<String>,
        /// Wait that elapsed
        timeout_ms: u64,
    },

    /// Zero semantic matches (e.g. unknown product name)
    #[error("{what} not found")]
    ElementNotFound {
        /// Description of what was searched for
        what: String,
    },

    /// More than one semantic match where exactly one was required
    #[error("{what} is ambiguous: {count} matches")]
    AmbiguousMatch {
        /// Description of what was searched for
        what: String,
        /// Number of matches
        count: usize,
    },

    /// A post-condition did not hold
    #[error("Assertion failed: {description}: expected {expected}, observed {actual}")]
    AssertionFailure {
        /// What was asserted
        description: String,
        /// Expected value or pattern
        expected: String,
        /// Observed value
        actual: String,
    },

    /// A polled assertion never held within its deadline
    #[error(
        "Assertion timed out after {timeout_ms}ms: {description}: expected {expected}, last observed {last_observed}"
    )]
    AssertionTimeout {
        /// What was asserted
        description: String,
        /// Expected value or pattern
        expected: String,
        /// Last value (or read error) observed before the deadline
        last_observed: String,
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// Text that should have been numeric was not
    #[error("Cannot parse {target} from {text:?}")]
    ParseFailure {
        /// What the text was expected to hold
        target: &'static str,
        /// The offending text
        text: String,
    },

    /// Page load failed
    #[error("Navigation to {url} failed: {message}")]
    NavigationFailure {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// An element handle no longer refers to a live element
    #[error("Element handle {id} is stale")]
    StaleElement {
        /// Opaque element id
        id: String,
    },

    /// An action was invoked from a page state that cannot perform it
    #[error("Invalid transition: cannot {transition} from {from}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Attempted transition
        transition: String,
    },

    /// Opaque browser-layer error
    #[error("Browser error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Per-test deadline exceeded
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Invalid configuration input
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PomError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a poll read that failed this way may succeed on a later attempt.
    ///
    /// Covers the states a re-rendering page passes through: element not yet
    /// present, handle invalidated mid-read, text not yet populated.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailure { .. }
                | Self::ElementNotFound { .. }
                | Self::StaleElement { .. }
                | Self::ParseFailure { .. }
        )
    }

    /// Short kind name, stable for reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ResolutionFailure { .. } => "ResolutionFailure",
            Self::ElementNotFound { .. } => "ElementNotFound",
            Self::AmbiguousMatch { .. } => "AmbiguousMatch",
            Self::AssertionFailure { .. } => "AssertionFailure",
            Self::AssertionTimeout { .. } => "AssertionTimeout",
            Self::ParseFailure { .. } => "ParseFailure",
            Self::NavigationFailure { .. } => "NavigationFailure",
            Self::StaleElement { .. } => "StaleElement",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::Driver { .. } => "Driver",
            Self::BrowserLaunch { .. } => "BrowserLaunch",
            Self::Timeout { .. } => "Timeout",
            Self::Config { .. } => "Config",
            Self::Json(_) => "Json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(PomError::StaleElement { id: "r1".into() }.is_transient());
        assert!(PomError::ParseFailure {
            target: "cart count",
            text: "".into()
        }
        .is_transient());
        assert!(!PomError::driver("socket closed").is_transient());
        assert!(!PomError::AssertionFailure {
            description: "login".into(),
            expected: "/Products/i".into(),
            actual: "Epic sadface".into(),
        }
        .is_transient());
    }

    #[test]
    fn test_timeout_message_carries_last_observed() {
        let err = PomError::AssertionTimeout {
            description: "cart badge count".into(),
            expected: "2".into(),
            last_observed: "1".into(),
            timeout_ms: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("last observed 1"));
        assert_eq!(err.kind(), "AssertionTimeout");
    }
}
