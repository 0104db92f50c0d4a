//! Policy state and the rule engine.
//!
//! A [`Profile`] owns the resolved settings and the mutable call history. All
//! mutation goes through [`Profile::check`], which evaluates the quota rule and
//! then the duplicate rule for one call attempt.
//!
//! The call counter and the signature set sit behind a single mutex, so a
//! profile can be shared across threads (`Arc<Profile>`). Increment-and-compare
//! and check-and-insert are each one critical section. The lock is never held
//! while a handler runs, so callbacks are free to inspect the profile.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::{ConfigSource, ProfileConfig};
use crate::error::{GuardError, Result};
use crate::handler::{Rule, Violation, ViolationHandler};
use crate::signature::{CallArgs, CallSignature};

#[derive(Debug, Default)]
struct CallHistory {
    call_count: u64,
    seen: HashSet<CallSignature>,
}

/// Quota and duplicate-call policy for guarded calls.
#[derive(Debug)]
pub struct Profile {
    /// Call limit; `None` means unlimited and the quota rule is off.
    max_calls: Option<u64>,
    on_violation: ViolationHandler,
    on_violation_max_calls: ViolationHandler,
    on_violation_duplicate_call: ViolationHandler,
    duplicate_enabled: bool,
    history: Mutex<CallHistory>,
}

impl Profile {
    /// Profile with no rules enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(ProfileConfig::default())
    }

    /// Creates a profile builder.
    #[must_use]
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    /// Resolves a settings mapping into a profile.
    ///
    /// - `on_violation` defaults to `raise`.
    /// - Each per-rule handler falls back to `on_violation` independently.
    /// - The quota rule is on iff `max_calls` is present and non-negative.
    /// - The duplicate rule is on iff `on_violation_duplicate_call` is present.
    #[must_use]
    pub fn from_config(config: ProfileConfig) -> Self {
        let on_violation = config.on_violation.unwrap_or_default();
        let on_violation_max_calls = config
            .on_violation_max_calls
            .unwrap_or_else(|| on_violation.clone());
        let duplicate_enabled = config.on_violation_duplicate_call.is_some();
        let on_violation_duplicate_call = config
            .on_violation_duplicate_call
            .unwrap_or_else(|| on_violation.clone());
        let max_calls = config.max_calls.and_then(|n| u64::try_from(n).ok());

        tracing::debug!(
            max_calls = ?max_calls,
            on_violation_max_calls = %on_violation_max_calls,
            on_violation_duplicate_call = %on_violation_duplicate_call,
            duplicate_enabled,
            "profile created"
        );

        Self {
            max_calls,
            on_violation,
            on_violation_max_calls,
            on_violation_duplicate_call,
            duplicate_enabled,
            history: Mutex::new(CallHistory::default()),
        }
    }

    /// Loads a profile from a JSON or YAML settings file.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        ProfileConfig::load(path).map(Self::from_config)
    }

    /// Evaluates every enabled rule for one call attempt.
    ///
    /// The quota rule runs first, then the duplicate rule. A `warn` violation
    /// logs and lets evaluation continue; a `raise` violation or a failing
    /// callback returns immediately with the error.
    pub fn check(&self, identity: &str, args: &CallArgs) -> Result<()> {
        if let Some(limit) = self.max_calls {
            let count = {
                let mut history = self.history.lock();
                history.call_count += 1;
                history.call_count
            };
            if count > limit {
                self.dispatch(
                    &self.on_violation_max_calls,
                    Violation::MaxCalls { count, limit },
                )?;
            }
        }

        if self.duplicate_enabled {
            let signature = CallSignature::new(identity, args);
            let first_seen = self.history.lock().seen.insert(signature);
            if !first_seen {
                self.dispatch(
                    &self.on_violation_duplicate_call,
                    Violation::DuplicateCall {
                        identity: identity.to_string(),
                        args: args.clone(),
                    },
                )?;
            }
        }

        Ok(())
    }

    fn dispatch(&self, handler: &ViolationHandler, violation: Violation) -> Result<()> {
        match handler {
            ViolationHandler::Warn => {
                match &violation {
                    Violation::MaxCalls { count, limit } => tracing::warn!(
                        rule = %Rule::MaxCalls,
                        count,
                        limit,
                        "gardefou: {violation}"
                    ),
                    Violation::DuplicateCall { identity, .. } => tracing::warn!(
                        rule = %Rule::DuplicateCall,
                        identity = %identity,
                        "gardefou: {violation}"
                    ),
                }
                Ok(())
            }
            ViolationHandler::Raise => Err(GuardError::QuotaExceeded(violation)),
            ViolationHandler::Callback(callback) => {
                tracing::debug!(rule = %violation.rule(), "invoking violation callback");
                callback.call(self).map_err(GuardError::Handler)
            }
        }
    }

    /// Number of calls counted by the quota rule so far.
    ///
    /// Stays at zero while the quota rule is off.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.history.lock().call_count
    }

    /// Configured call limit, `None` when unlimited.
    #[must_use]
    pub const fn max_calls(&self) -> Option<u64> {
        self.max_calls
    }

    /// Default violation policy.
    #[must_use]
    pub const fn on_violation(&self) -> &ViolationHandler {
        &self.on_violation
    }

    /// Quota rule policy.
    #[must_use]
    pub const fn on_violation_max_calls(&self) -> &ViolationHandler {
        &self.on_violation_max_calls
    }

    /// Duplicate rule policy.
    #[must_use]
    pub const fn on_violation_duplicate_call(&self) -> &ViolationHandler {
        &self.on_violation_duplicate_call
    }

    /// Handler for a given rule.
    #[must_use]
    pub const fn handler(&self, rule: Rule) -> &ViolationHandler {
        match rule {
            Rule::MaxCalls => &self.on_violation_max_calls,
            Rule::DuplicateCall => &self.on_violation_duplicate_call,
        }
    }

    /// Whether the quota rule is enforced.
    #[must_use]
    pub const fn quota_enabled(&self) -> bool {
        self.max_calls.is_some()
    }

    /// Whether the duplicate rule is enforced.
    #[must_use]
    pub const fn duplicate_enabled(&self) -> bool {
        self.duplicate_enabled
    }

    /// Number of distinct call signatures recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.history.lock().seen.len()
    }

    /// Whether a call with this identity and these arguments was recorded.
    #[must_use]
    pub fn has_seen(&self, identity: &str, args: &CallArgs) -> bool {
        self.history
            .lock()
            .seen
            .contains(&CallSignature::new(identity, args))
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ProfileConfig> for Profile {
    fn from(config: ProfileConfig) -> Self {
        Self::from_config(config)
    }
}

/// Builder layering explicit settings over a base settings source.
#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    source: ConfigSource,
    overrides: ProfileConfig,
}

impl ProfileBuilder {
    /// Uses a settings mapping as the base layer.
    #[must_use]
    pub fn config(mut self, config: ProfileConfig) -> Self {
        self.source = ConfigSource::Settings(config);
        self
    }

    /// Uses a JSON or YAML file as the base layer.
    #[must_use]
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.source = ConfigSource::File(path.as_ref().to_path_buf());
        self
    }

    /// Sets the base layer.
    #[must_use]
    pub fn source(mut self, source: impl Into<ConfigSource>) -> Self {
        self.source = source.into();
        self
    }

    /// Overrides the call limit.
    #[must_use]
    pub const fn max_calls(mut self, max_calls: i64) -> Self {
        self.overrides.max_calls = Some(max_calls);
        self
    }

    /// Overrides the default policy.
    #[must_use]
    pub fn on_violation(mut self, handler: ViolationHandler) -> Self {
        self.overrides.on_violation = Some(handler);
        self
    }

    /// Overrides the quota rule policy.
    #[must_use]
    pub fn on_violation_max_calls(mut self, handler: ViolationHandler) -> Self {
        self.overrides.on_violation_max_calls = Some(handler);
        self
    }

    /// Overrides the duplicate rule policy, enabling the rule.
    #[must_use]
    pub fn on_violation_duplicate_call(mut self, handler: ViolationHandler) -> Self {
        self.overrides.on_violation_duplicate_call = Some(handler);
        self
    }

    /// Resolves the base layer and merges the overrides on top.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`] if a file source cannot be loaded.
    pub fn settings(self) -> Result<ProfileConfig> {
        Ok(self.source.resolve()?.merge(self.overrides))
    }

    /// Builds the profile.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`] if a file source cannot be loaded.
    pub fn build(self) -> Result<Profile> {
        self.settings().map(Profile::from_config)
    }
}
