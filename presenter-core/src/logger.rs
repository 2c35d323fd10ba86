//! C3: structured JSON-lines request/event log with daily rotation and
//! age-based pruning (spec §4.3). Distinct from the `tracing` subscriber
//! `presenter-server::main` installs for operator diagnostics — this is
//! the durable, app-specific audit trail spec §3 describes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// One structured log line. `fields` carries route-specific extras (status,
/// latencyMs, clientIp, userEmail, route, stack) flattened into the JSON
/// object, per spec §3.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub ts: DateTime<Utc>,
    pub level: Level,
    pub msg: String,
    pub fields: Map<String, Value>,
}

impl LogEntry {
    pub fn new(level: Level, msg: impl Into<String>) -> Self {
        Self { ts: Utc::now(), level, msg: msg.into(), fields: Map::new() }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    fn to_json_line(&self) -> String {
        let mut object = Map::new();
        object.insert("ts".to_string(), Value::String(self.ts.to_rfc3339()));
        object.insert("level".to_string(), serde_json::to_value(self.level).unwrap());
        object.insert("msg".to_string(), Value::String(self.msg.clone()));
        for (k, v) in &self.fields {
            object.insert(k.clone(), v.clone());
        }
        Value::Object(object).to_string()
    }
}

#[derive(Debug)]
pub struct FileLogger {
    dir: PathBuf,
    retention_days: u32,
    state: Mutex<RotationState>,
}

#[derive(Debug)]
struct RotationState {
    current_date: NaiveDate,
}

impl FileLogger {
    /// Opens `<data_dir>/logs/`, creating it if needed, and prunes files
    /// older than `retention_days`. A filesystem failure here degrades to
    /// stderr-only logging rather than failing startup (spec §4.3, §7).
    pub fn open(data_dir: &Path, retention_days: u32) -> Self {
        let dir = data_dir.join("logs");
        if let Err(err) = std::fs::create_dir_all(&dir) {
            eprintln!("presenter-proxy: failed to create log directory: {err}");
        }
        let logger = Self { dir, retention_days, state: Mutex::new(RotationState { current_date: Utc::now().date_naive() }) };
        logger.prune_old_files();
        logger
    }

    fn file_name_for(date: NaiveDate) -> String {
        format!("web-{}.log", date.format("%Y-%m-%d"))
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::file_name_for(date))
    }

    /// Deletes any `web-YYYY-MM-DD.log` file older than `retention_days`.
    /// Runs on startup and is re-invoked once per day by the caller.
    pub fn prune_old_files(&self) {
        let cutoff = Utc::now().date_naive() - chrono::Duration::days(self.retention_days as i64);
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(date_str) = name.strip_prefix("web-").and_then(|s| s.strip_suffix(".log")) else { continue };
            let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else { continue };
            if date < cutoff {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }

    pub fn log(&self, entry: LogEntry) {
        let today = entry.ts.date_naive();
        {
            let mut state = self.state.lock();
            if state.current_date != today {
                state.current_date = today;
                drop(state);
                self.prune_old_files();
            }
        }

        let line = entry.to_json_line();
        match OpenOptions::new().create(true).append(true).open(self.path_for(today)) {
            Ok(mut file) => {
                if let Err(err) = writeln!(file, "{line}") {
                    eprintln!("presenter-proxy: log write failed, falling back to stderr: {err}");
                    eprintln!("{line}");
                }
            }
            Err(err) => {
                eprintln!("presenter-proxy: could not open log file ({err}), falling back to stderr");
                eprintln!("{line}");
            }
        }
    }

    pub fn info(&self, msg: impl Into<String>) -> LogEntryBuilder<'_> {
        LogEntryBuilder { logger: self, entry: LogEntry::new(Level::Info, msg) }
    }

    pub fn warn(&self, msg: impl Into<String>) -> LogEntryBuilder<'_> {
        LogEntryBuilder { logger: self, entry: LogEntry::new(Level::Warn, msg) }
    }

    pub fn error(&self, msg: impl Into<String>) -> LogEntryBuilder<'_> {
        LogEntryBuilder { logger: self, entry: LogEntry::new(Level::Error, msg) }
    }
}

/// Fluent builder so call sites read `logger.info("request").with("status", 200).emit()`.
pub struct LogEntryBuilder<'a> {
    logger: &'a FileLogger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entry = self.entry.with(key, value);
        self
    }

    pub fn emit(self) {
        self.logger.log(self.entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_json_line_per_day_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileLogger::open(dir.path(), 14);
        logger.info("request handled").with("status", 200).with("route", "/api/status").emit();

        let today = Utc::now().date_naive();
        let contents = std::fs::read_to_string(dir.path().join("logs").join(FileLogger::file_name_for(today))).unwrap();
        let line = contents.lines().next().unwrap();
        let parsed: Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["msg"], "request handled");
        assert_eq!(parsed["status"], 200);
        assert_eq!(parsed["level"], "info");
    }

    #[test]
    fn prune_removes_files_older_than_retention() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        std::fs::create_dir_all(&logs_dir).unwrap();
        let old_date = Utc::now().date_naive() - chrono::Duration::days(30);
        std::fs::write(logs_dir.join(FileLogger::file_name_for(old_date)), "{}\n").unwrap();

        let logger = FileLogger::open(dir.path(), 14);
        logger.prune_old_files();

        assert!(!logs_dir.join(FileLogger::file_name_for(old_date)).exists());
    }
}
