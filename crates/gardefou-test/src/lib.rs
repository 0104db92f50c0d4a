//! # gardefou-test
//!
//! Testing infrastructure for gardefou.
//!
//! This crate provides:
//! - **Log capture**: assert on warning records emitted by `warn` policies
//! - **Call recording**: count how often a guarded callable really ran
//! - **Falsification tests**: Popperian tests for the guard's documented claims
//!
//! ## Example
//!
//! ```rust
//! use gardefou_core::{Guard, ViolationHandler};
//! use gardefou_test::{CallRecorder, LogCapture};
//!
//! let guard = Guard::builder()
//!     .max_calls(1)
//!     .on_violation_max_calls(ViolationHandler::Warn)
//!     .build()?;
//! let recorder = CallRecorder::new();
//! let ping = recorder.track(|n: u32| n + 1);
//!
//! let capture = LogCapture::new();
//! capture.run(|| {
//!     let _ = guard.invoke_named("ping", &ping, 1);
//!     let _ = guard.invoke_named("ping", &ping, 2);
//! });
//!
//! assert_eq!(recorder.runs(), 2);
//! capture.expect_warning("call quota exceeded")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod capture;
pub mod error;
pub mod recorder;

pub use capture::{CaptureWriter, LogCapture};
pub use error::{Result, TestError};
pub use recorder::CallRecorder;
