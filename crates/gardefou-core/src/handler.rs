//! Violation handlers and the violations they respond to.
//!
//! A handler policy is resolved once, when the settings are parsed, into a
//! [`ViolationHandler`] variant. Nothing is re-inspected at check time.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BoxError, GuardError};
use crate::profile::Profile;
use crate::signature::CallArgs;

type CallbackFn = dyn Fn(&Profile) -> std::result::Result<(), BoxError> + Send + Sync;

/// User-supplied violation callback.
///
/// Receives the [`Profile`] whose rule was breached. Returning `Err` aborts the
/// guarded call; the error reaches the caller as [`GuardError::Handler`].
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    /// Wraps a closure as a violation callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Profile) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, profile: &Profile) -> std::result::Result<(), BoxError> {
        (self.0)(profile)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Response to a rule violation.
#[derive(Debug, Clone, Default)]
pub enum ViolationHandler {
    /// Log a warning and let the call through.
    Warn,
    /// Abort the call with [`GuardError::QuotaExceeded`].
    #[default]
    Raise,
    /// Run a user callback; its result decides whether the call proceeds.
    Callback(Callback),
}

impl ViolationHandler {
    /// Builds a callback handler from a closure.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Profile) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::Callback(Callback::new(f))
    }

    /// Policy name as it appears in settings files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Raise => "raise",
            Self::Callback(_) => "callback",
        }
    }

    /// Returns true for the `warn` policy.
    #[must_use]
    pub const fn is_warn(&self) -> bool {
        matches!(self, Self::Warn)
    }

    /// Returns true for the `raise` policy.
    #[must_use]
    pub const fn is_raise(&self) -> bool {
        matches!(self, Self::Raise)
    }

    /// Returns true for a callback policy.
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

impl PartialEq for ViolationHandler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Warn, Self::Warn) | (Self::Raise, Self::Raise) => true,
            (Self::Callback(a), Self::Callback(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Display for ViolationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationHandler {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(Self::Warn),
            "raise" => Ok(Self::Raise),
            other => Err(GuardError::config(format!(
                "invalid violation handler: {other:?} (expected \"warn\" or \"raise\")"
            ))),
        }
    }
}

impl Serialize for ViolationHandler {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ViolationHandler {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The two rules a [`Profile`] can enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Total invocation quota.
    MaxCalls,
    /// Repeated invocation with identical name and arguments.
    DuplicateCall,
}

impl Rule {
    /// Settings key of the rule's handler.
    #[must_use]
    pub const fn handler_key(self) -> &'static str {
        match self {
            Self::MaxCalls => "on_violation_max_calls",
            Self::DuplicateCall => "on_violation_duplicate_call",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxCalls => f.write_str("max_calls"),
            Self::DuplicateCall => f.write_str("duplicate_call"),
        }
    }
}

/// A detected rule breach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The call count went past the configured limit.
    MaxCalls {
        /// Call count including the offending call.
        count: u64,
        /// Configured limit.
        limit: u64,
    },
    /// The same call was seen before.
    DuplicateCall {
        /// Identity of the callable.
        identity: String,
        /// Arguments of the repeated call.
        args: CallArgs,
    },
}

impl Violation {
    /// Rule that was breached.
    #[must_use]
    pub const fn rule(&self) -> Rule {
        match self {
            Self::MaxCalls { .. } => Rule::MaxCalls,
            Self::DuplicateCall { .. } => Rule::DuplicateCall,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxCalls { count, limit } => {
                write!(f, "call quota exceeded ({count}/{limit})")
            }
            Self::DuplicateCall { identity, args } => write!(
                f,
                "duplicate call detected for {identity} with args {} and kwargs {}",
                args.positional_display(),
                args.keyword_display()
            ),
        }
    }
}
