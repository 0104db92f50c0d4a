//! gardefou: a guard for expensive calls
//!
//! Wrap any callable in a [`Guard`](prelude::Guard) to cap how many times it
//! runs and to catch repeated identical calls, without touching the callable.
//!
//! # Quick Start
//!
//! ```rust
//! use gardefou::prelude::*;
//!
//! fn fetch(id: u32) -> String {
//!     format!("record-{id}")
//! }
//!
//! let guard = Guard::builder()
//!     .max_calls(10)
//!     .on_violation_duplicate_call(ViolationHandler::Warn)
//!     .build()?;
//!
//! assert_eq!(guard.invoke(fetch, 7)?, "record-7");
//! # Ok::<(), GuardError>(())
//! ```

pub use gardefou_core as core;

/// Prelude module for common imports.
pub mod prelude {
    pub use gardefou_core::{
        BoxError, CallArgs, Guard, GuardBuilder, GuardError, Guarded, Profile, ProfileBuilder,
        ProfileConfig, Rule, Violation, ViolationHandler,
    };
}
