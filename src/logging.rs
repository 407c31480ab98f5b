//! Logging initialization and the logger capability used by the I/O taps.

use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "execopts=info";

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `execopts=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    init_with_filter(None);
}

/// Initialize the logging system with an explicit filter directive.
///
/// A `None` filter falls back to `RUST_LOG` and then to the default.
pub fn init_with_filter(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(env_filter(filter))
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(None))
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
}

fn env_filter(filter: Option<&str>) -> EnvFilter {
    match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Leveled log sink used by the command logging entry point and the log taps.
pub trait Logger: Send + Sync {
    /// Emit a debug record.
    fn debug(&self, msg: &str);
    /// Emit an info record.
    fn info(&self, msg: &str);
    /// Emit an error record.
    fn error(&self, msg: &str);

    /// Emit a record at the given level.
    ///
    /// Levels without a dedicated method are folded into the nearest one.
    fn log(&self, level: Level, msg: &str) {
        match level {
            Level::ERROR | Level::WARN => self.error(msg),
            Level::INFO => self.info(msg),
            Level::DEBUG | Level::TRACE => self.debug(msg),
        }
    }
}

/// Logger that forwards every record to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(target: "execopts", "{}", msg);
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "execopts", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "execopts", "{}", msg);
    }
}

/// Logger that keeps every record in memory.
///
/// Clones share the same record list.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryLogger {
    /// Create an empty memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<(Level, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages recorded at the given level.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }

    /// Whether any record contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|(_, msg)| msg.contains(needle))
    }

    fn push(&self, level: Level, msg: &str) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((level, msg.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, msg: &str) {
        self.push(Level::DEBUG, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Level::INFO, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::ERROR, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_idempotent() {
        // First call may or may not succeed depending on test order
        let _ = try_init();
        let _ = try_init();
    }

    #[test]
    fn test_tracing_logger_emits() {
        let _ = try_init();

        let logger = TracingLogger;
        logger.debug("test debug message");
        logger.info("test info message");
        logger.error("test error message");
    }

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.debug("one");
        logger.info("two");
        logger.error("three");

        assert_eq!(logger.records().len(), 3);
        assert_eq!(logger.messages(Level::DEBUG), vec!["one"]);
        assert_eq!(logger.messages(Level::INFO), vec!["two"]);
        assert_eq!(logger.messages(Level::ERROR), vec!["three"]);
    }

    #[test]
    fn test_memory_logger_clones_share_records() {
        let logger = MemoryLogger::new();
        let clone = logger.clone();
        clone.info("shared");
        assert!(logger.contains("shared"));
    }

    #[test]
    fn test_log_dispatches_by_level() {
        let logger = MemoryLogger::new();
        logger.log(Level::WARN, "warned");
        logger.log(Level::TRACE, "traced");

        assert_eq!(logger.messages(Level::ERROR), vec!["warned"]);
        assert_eq!(logger.messages(Level::DEBUG), vec!["traced"]);
    }
}
