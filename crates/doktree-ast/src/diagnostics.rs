//! Diagnostic records and logger plumbing.
//!
//! Conditions worth reporting without aborting a build (a dropped write to a
//! locked attribute, an unresolvable cross reference) flow through a
//! [`Logger`] as structured [`LogRecord`]s instead of the error channel.
//! Every [`Document`](crate::document::Document) holds its own logger
//! handle; [`LoggerManager`] keeps the process-wide default that documents
//! pick up when the embedder does not supply one.
//!
//! [`TraceLogger`] forwards records to the `tracing` facade and is the
//! initial process default. [`MemoryLogger`] captures records for
//! inspection, which is what tests and tooling usually want.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic record: severity, message text, and the source
/// location it refers to when one is known.
///
/// Records are value objects; once emitted they are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogRecord {
            severity,
            message: message.into(),
            cursor: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Attaches the source location the record refers to.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// True for error and fatal records.
    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(cursor) = &self.cursor {
            write!(f, " ({})", cursor)?;
        }
        Ok(())
    }
}

/// Sink for diagnostic records.
///
/// Implementations must tolerate being shared across threads; `log` takes
/// `&self` so a logger can sit behind an `Arc` held by several documents.
pub trait Logger: Send + Sync + fmt::Debug {
    fn log(&self, record: LogRecord);
}

/// Logger that forwards records to the `tracing` facade.
///
/// Emits nothing by itself; output depends on whatever subscriber the
/// embedding application installed.
#[derive(Debug, Default)]
pub struct TraceLogger;

impl Logger for TraceLogger {
    fn log(&self, record: LogRecord) {
        match record.severity {
            Severity::Debug => tracing::debug!("{}", record),
            Severity::Info => tracing::info!("{}", record),
            Severity::Warn => tracing::warn!("{}", record),
            Severity::Error | Severity::Fatal => tracing::error!("{}", record),
        }
    }
}

/// Logger that accumulates every record in memory, in emission order.
///
/// Nothing is discarded or capped; callers manage growth by reading and
/// clearing between phases. All access is serialized behind a mutex, so
/// records emitted from concurrent builds interleave whole, never torn.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        MemoryLogger::default()
    }

    /// Returns a snapshot copy of the accumulated records. Mutating the
    /// returned vector has no effect on the logger.
    pub fn messages(&self) -> Vec<LogRecord> {
        self.guard().clone()
    }

    /// The highest severity seen so far, if any record was emitted.
    pub fn max_severity(&self) -> Option<Severity> {
        self.guard().iter().map(|r| r.severity).max()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Drops all accumulated records.
    pub fn clear(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Logger for MemoryLogger {
    fn log(&self, record: LogRecord) {
        self.guard().push(record);
    }
}

static CURRENT_LOGGER: Lazy<RwLock<Arc<dyn Logger>>> =
    Lazy::new(|| RwLock::new(Arc::new(TraceLogger)));

/// Process-wide current-logger slot.
///
/// Documents capture the current logger at construction time, so swapping
/// the slot affects documents built afterwards, not ones already built.
pub struct LoggerManager;

impl LoggerManager {
    /// Returns a handle to the current process-wide logger.
    pub fn logger() -> Arc<dyn Logger> {
        Arc::clone(&Self::slot_read())
    }

    /// Installs `logger` as the process-wide logger and returns the
    /// previous one.
    pub fn set_logger(logger: Arc<dyn Logger>) -> Arc<dyn Logger> {
        let mut slot = Self::slot_write();
        std::mem::replace(&mut *slot, logger)
    }

    /// Restores the initial [`TraceLogger`].
    pub fn reset() {
        *Self::slot_write() = Arc::new(TraceLogger);
    }

    fn slot_read() -> std::sync::RwLockReadGuard<'static, Arc<dyn Logger>> {
        match CURRENT_LOGGER.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn slot_write() -> std::sync::RwLockWriteGuard<'static, Arc<dyn Logger>> {
        match CURRENT_LOGGER.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
