//! Error types for gardefou-core.
//!
//! Every failure mode is an explicit variant; the guard never panics and never
//! swallows an error raised by a user-supplied handler.

use crate::handler::{Rule, Violation};

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Boxed error returned by violation callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`Profile`](crate::Profile) and [`Guard`](crate::Guard).
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// Settings source is unreadable, unparseable or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A rule configured with the `raise` policy was violated.
    #[error("gardefou: {0}")]
    QuotaExceeded(Violation),

    /// Call arguments could not be captured for duplicate detection.
    #[error("invalid call arguments: {0}")]
    Arguments(String),

    /// Error raised by a user-supplied violation callback, passed through as-is.
    #[error(transparent)]
    Handler(BoxError),
}

impl GuardError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an arguments error.
    #[must_use]
    pub fn arguments(msg: impl Into<String>) -> Self {
        Self::Arguments(msg.into())
    }

    /// Returns true if a `raise` policy blocked the call.
    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }

    /// Returns the violation that blocked the call, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match self {
            Self::QuotaExceeded(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the rule that blocked the call, if any.
    #[must_use]
    pub fn rule(&self) -> Option<Rule> {
        self.violation().map(Violation::rule)
    }

    /// Returns the callback's own error, if this error came from a handler.
    #[must_use]
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
