#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON-lines logging shared across the fungihost crates.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Log severity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Recoverable problem, e.g. a skipped lifecycle phase.
    Warn,
    /// Failure requiring attention.
    Error,
}

/// One structured log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Emission time in UTC.
    pub timestamp: DateTime<Utc>,
    /// Component emitting the record (e.g. `lifecycle`, `fungi-cli`).
    pub component: String,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Lifecycle cycle number, when the record belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u64>,
    /// Arbitrary JSON payload.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(component: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.into(),
            level,
            message: message.into(),
            cycle: None,
            fields: serde_json::Map::new(),
        }
    }

    /// Attaches the lifecycle cycle number.
    #[must_use]
    pub const fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a JSON payload; non-object values are stored under `"value"`.
    #[must_use]
    pub fn with_fields(mut self, payload: serde_json::Value) -> Self {
        match payload {
            serde_json::Value::Object(map) => self.fields = map,
            other => {
                self.fields.insert("value".into(), other);
            }
        }
        self
    }
}

/// Append-only JSON-lines logger guarded by a mutex.
#[derive(Debug)]
pub struct JsonLogger {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonLogger {
    /// Creates or opens the log file, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Appends one record as a JSON line.
    pub fn log(&self, record: &LogRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_json_lines() {
        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("bot.log")).unwrap();
        logger
            .log(&LogRecord::new("lifecycle", LogLevel::Info, "cycle complete").with_cycle(3))
            .unwrap();
        let content = fs::read_to_string(logger.path()).unwrap();
        assert!(content.contains("\"message\":\"cycle complete\""));
        assert!(content.contains("\"cycle\":3"));
    }

    #[test]
    fn records_round_trip_through_serde() {
        let record = LogRecord::new("rules", LogLevel::Warn, "dropped clause")
            .with_fields(serde_json::json!({ "clause": " " }));
        let line = serde_json::to_string(&record).unwrap();
        let parsed: LogRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.component, "rules");
        assert_eq!(parsed.level, LogLevel::Warn);
        assert_eq!(parsed.fields["clause"], " ");
    }
}
