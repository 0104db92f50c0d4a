//! Log capture for asserting on warning records.
//!
//! Installs a `tracing-subscriber` fmt subscriber whose writer is an in-memory
//! buffer, scoped to the current thread.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{Result, TestError};

/// In-memory sink for formatted log records.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish()
    }

    /// Runs `f` with this capture as the thread's default subscriber.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::subscriber::with_default(self.subscriber(), f)
    }

    /// Installs this capture until the returned guard is dropped.
    ///
    /// Use this from async tests, where a closure scope does not fit.
    #[must_use]
    pub fn enter(&self) -> DefaultGuard {
        tracing::subscriber::set_default(self.subscriber())
    }

    /// Everything captured so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Captured lines at WARN level.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.trim_start().starts_with("WARN"))
            .map(str::to_string)
            .collect()
    }

    /// Number of WARN lines containing `needle`.
    #[must_use]
    pub fn count_warnings(&self, needle: &str) -> usize {
        self.warnings()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Whether any WARN line contains `needle`.
    #[must_use]
    pub fn has_warning(&self, needle: &str) -> bool {
        self.count_warnings(needle) > 0
    }

    /// Fails unless a WARN line contains `needle`.
    pub fn expect_warning(&self, needle: &str) -> Result<()> {
        if self.has_warning(needle) {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "no warning containing {needle:?}; captured:\n{}",
                self.contents()
            )))
        }
    }

    /// Discards everything captured so far.
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

/// Writer handed out per log record.
#[derive(Debug)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}
