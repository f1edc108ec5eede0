//! Human-readable progress lines.
//!
//! The optimizer writes one line per stage transition through an injected
//! [`Logger`]. This is separate from the structured `tracing` events emitted
//! when the `tracing` feature is enabled; [`TracingLogger`] bridges the two.

use parking_lot::Mutex;

/// A sink for progress lines.
pub trait Logger: Send + Sync {
    /// Records an informational line.
    fn info(&self, message: &str);

    /// Records a warning. The default implementation forwards to
    /// [`info`](Logger::info) with a `[WARNING] ` prefix.
    fn warn(&self, message: &str) {
        self.info(&format!("[WARNING] {message}"));
    }
}

/// Prints lines to standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn info(&self, message: &str) {
        println!("{message}");
    }
}

/// Keeps lines in memory, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every line recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns the recorded warnings, without their prefix.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|l| l.strip_prefix("[WARNING] ").map(str::to_owned))
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str) {
        self.lines.lock().push(message.to_owned());
    }
}

/// Forwards lines to `tracing` at `INFO` and `WARN` level.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

#[cfg(feature = "tracing")]
impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "mobo", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "mobo", "{message}");
    }
}
