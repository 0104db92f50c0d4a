//! Call interception.
//!
//! A [`Guard`] runs [`Profile::check`] for every call it forwards and only
//! invokes the wrapped callable when the check passes. It never retries, never
//! caches a result, and never awaits on the caller's behalf: if the callable
//! returns a future, the future is handed back untouched.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ProfileConfig;
use crate::error::Result;
use crate::handler::ViolationHandler;
use crate::profile::{Profile, ProfileBuilder};
use crate::signature::CallArgs;

/// Identity of a callable type, as reported by the compiler.
///
/// Named functions resolve to their full path (`my_crate::api::complete`).
/// All closures defined in the same function share one identity, as do all
/// values of one function-pointer type; use [`Guard::invoke_named`] to tell
/// them apart.
#[must_use]
pub fn callable_name<F>() -> &'static str {
    std::any::type_name::<F>()
}

/// Callable guard backed by a shared [`Profile`].
///
/// Cloning a guard shares its profile, so clones pool one quota and one
/// duplicate window.
#[derive(Debug, Clone, Default)]
pub struct Guard {
    profile: Arc<Profile>,
}

impl Guard {
    /// Creates a guard from an owned or shared profile.
    pub fn new(profile: impl Into<Arc<Profile>>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    /// Creates a guard that shares `profile` with its other users.
    #[must_use]
    pub const fn with_profile(profile: Arc<Profile>) -> Self {
        Self { profile }
    }

    /// Creates a guard owning a profile built from `config`.
    #[must_use]
    pub fn from_config(config: ProfileConfig) -> Self {
        Self::new(Profile::from_config(config))
    }

    /// Creates a guard builder.
    #[must_use]
    pub fn builder() -> GuardBuilder {
        GuardBuilder::default()
    }

    /// The profile this guard enforces.
    #[must_use]
    pub const fn profile(&self) -> &Arc<Profile> {
        &self.profile
    }

    /// Checks the call, then invokes `f(args)`.
    ///
    /// The call identity is the callable's type name (see [`callable_name`]).
    /// When the duplicate rule is on, `args` is captured into [`CallArgs`]
    /// (see [`CallArgs::from_serialize`]): tuples are positional arguments,
    /// structs are keyword arguments. Arguments without a JSON form then fail
    /// with [`GuardError::Arguments`](crate::GuardError::Arguments) and the
    /// callable does not run.
    pub fn invoke<F, A, R>(&self, f: F, args: A) -> Result<R>
    where
        F: FnOnce(A) -> R,
        A: Serialize,
    {
        self.invoke_named(callable_name::<F>(), f, args)
    }

    /// Like [`invoke`](Self::invoke) with an explicit call identity.
    pub fn invoke_named<F, A, R>(&self, identity: &str, f: F, args: A) -> Result<R>
    where
        F: FnOnce(A) -> R,
        A: Serialize,
    {
        let call_args = if self.profile.duplicate_enabled() {
            CallArgs::from_serialize(&args)?
        } else {
            CallArgs::new()
        };
        self.profile.check(identity, &call_args)?;
        Ok(f(args))
    }

    /// Checks a call described by prebuilt [`CallArgs`], then invokes `f`.
    pub fn invoke_with<F, R>(&self, identity: &str, args: &CallArgs, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        self.profile.check(identity, args)?;
        Ok(f())
    }

    /// Binds `f` to this guard, producing a reusable guarded callable.
    pub fn wrap<F>(&self, identity: impl Into<String>, f: F) -> Guarded<F> {
        Guarded {
            guard: self.clone(),
            identity: identity.into(),
            f,
        }
    }
}

impl From<Profile> for Guard {
    fn from(profile: Profile) -> Self {
        Self::new(profile)
    }
}

impl From<Arc<Profile>> for Guard {
    fn from(profile: Arc<Profile>) -> Self {
        Self::with_profile(profile)
    }
}

/// A callable permanently bound to a [`Guard`].
pub struct Guarded<F> {
    guard: Guard,
    identity: String,
    f: F,
}

impl<F> Guarded<F> {
    /// Checks the call, then invokes the bound callable with `args`.
    pub fn call<A, R>(&self, args: A) -> Result<R>
    where
        F: Fn(A) -> R,
        A: Serialize,
    {
        self.guard.invoke_named(&self.identity, &self.f, args)
    }

    /// Identity used for duplicate detection.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The guard enforcing this callable.
    #[must_use]
    pub const fn guard(&self) -> &Guard {
        &self.guard
    }
}

impl<F> fmt::Debug for Guarded<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("identity", &self.identity)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Guard`].
///
/// An explicit [`profile`](Self::profile) always wins over the settings
/// setters, which are then ignored.
#[derive(Debug, Clone, Default)]
pub struct GuardBuilder {
    profile: Option<Arc<Profile>>,
    settings: ProfileBuilder,
}

impl GuardBuilder {
    /// Uses an existing profile, shared rather than copied.
    #[must_use]
    pub fn profile(mut self, profile: Arc<Profile>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Uses a settings mapping as the base layer.
    #[must_use]
    pub fn config(mut self, config: ProfileConfig) -> Self {
        self.settings = self.settings.config(config);
        self
    }

    /// Uses a JSON or YAML file as the base layer.
    #[must_use]
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.settings = self.settings.config_file(path);
        self
    }

    /// Overrides the call limit.
    #[must_use]
    pub fn max_calls(mut self, max_calls: i64) -> Self {
        self.settings = self.settings.max_calls(max_calls);
        self
    }

    /// Overrides the default policy.
    #[must_use]
    pub fn on_violation(mut self, handler: ViolationHandler) -> Self {
        self.settings = self.settings.on_violation(handler);
        self
    }

    /// Overrides the quota rule policy.
    #[must_use]
    pub fn on_violation_max_calls(mut self, handler: ViolationHandler) -> Self {
        self.settings = self.settings.on_violation_max_calls(handler);
        self
    }

    /// Overrides the duplicate rule policy, enabling the rule.
    #[must_use]
    pub fn on_violation_duplicate_call(mut self, handler: ViolationHandler) -> Self {
        self.settings = self.settings.on_violation_duplicate_call(handler);
        self
    }

    /// Builds the guard.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`](crate::GuardError::Config) if no profile
    /// was given and the settings file cannot be loaded.
    pub fn build(self) -> Result<Guard> {
        match self.profile {
            Some(profile) => Ok(Guard::with_profile(profile)),
            None => self.settings.build().map(Guard::new),
        }
    }
}
