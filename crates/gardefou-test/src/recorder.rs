//! Execution counting for wrapped callables.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how often a callable actually ran.
///
/// Clones share one counter.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    runs: Arc<AtomicUsize>,
}

impl CallRecorder {
    /// Creates a recorder at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one execution.
    pub fn hit(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of recorded executions.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Wraps `f` so that every execution is recorded.
    pub fn track<A, R>(&self, f: impl Fn(A) -> R) -> impl Fn(A) -> R {
        let recorder = self.clone();
        move |args| {
            recorder.hit();
            f(args)
        }
    }
}
