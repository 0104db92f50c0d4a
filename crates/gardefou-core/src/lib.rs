// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # gardefou-core
//!
//! Call guard primitives: a [`Profile`] holding quota and duplicate-call
//! policy, and a [`Guard`] that checks every call against it before running
//! the wrapped callable.
//!
//! - **Quota rule**: at most `max_calls` calls per profile.
//! - **Duplicate rule**: flags a call repeating an earlier callable and
//!   argument combination.
//!
//! Each rule answers a violation with its handler: log a warning, raise
//! [`GuardError::QuotaExceeded`], or run a user callback.
//!
//! ## Example
//!
//! ```rust
//! use gardefou_core::{Guard, ViolationHandler};
//!
//! fn add((a, b): (i32, i32)) -> i32 {
//!     a + b
//! }
//!
//! let guard = Guard::builder()
//!     .max_calls(2)
//!     .on_violation_max_calls(ViolationHandler::Raise)
//!     .build()?;
//!
//! assert_eq!(guard.invoke(add, (1, 2))?, 3);
//! assert_eq!(guard.invoke(add, (3, 4))?, 7);
//! assert!(guard.invoke(add, (5, 6)).is_err());
//! # Ok::<(), gardefou_core::GuardError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod guard;
pub mod handler;
pub mod profile;
pub mod signature;

pub use config::{ConfigSource, ProfileConfig, SettingsFormat};
pub use error::{BoxError, GuardError, Result};
pub use guard::{Guard, GuardBuilder, Guarded, callable_name};
pub use handler::{Callback, Rule, Violation, ViolationHandler};
pub use profile::{Profile, ProfileBuilder};
pub use signature::{CallArgs, CallSignature};
