//! Append-only session log under the log directory.
//!
//! One file per run, named after the start time. Records are never rewritten;
//! when the file cannot be created or written, records go to stderr instead.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use tracing::warn;

/// Fixed component tag written with every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Lifecycle,
    GoalReceived,
    ApiCall,
    CommandExtracted,
    Confirmation,
    CommandOutput,
    CommandExecuted,
    Refusal,
    Error,
}

impl RecordKind {
    pub fn tag(self) -> &'static str {
        match self {
            RecordKind::Lifecycle => "lifecycle",
            RecordKind::GoalReceived => "goal",
            RecordKind::ApiCall => "api",
            RecordKind::CommandExtracted => "command",
            RecordKind::Confirmation => "confirm",
            RecordKind::CommandOutput => "output",
            RecordKind::CommandExecuted => "executed",
            RecordKind::Refusal => "refusal",
            RecordKind::Error => "error",
        }
    }
}

/// File name for a session started at `started`, e.g. `nlsh-20261018-093000.log`.
pub fn log_file_name(started: &DateTime<FixedOffset>) -> String {
    format!("nlsh-{}.log", started.format("%Y%m%d-%H%M%S"))
}

/// Render one record. Continuation lines are indented so every record starts
/// with a timestamp at column zero.
pub fn format_record(at: &DateTime<FixedOffset>, kind: RecordKind, message: &str) -> String {
    let mut lines = message.lines();
    let first = lines.next().unwrap_or_default();
    let mut buf = format!(
        "{} [{}] {}\n",
        at.format("%Y-%m-%dT%H:%M:%S%:z"),
        kind.tag(),
        first
    );
    for line in lines {
        buf.push_str("  ");
        buf.push_str(line);
        buf.push('\n');
    }
    buf
}

pub struct SessionLog {
    path: Option<PathBuf>,
    file: Option<File>,
    stderr: Box<dyn Write>,
}

impl SessionLog {
    /// Create `<dir>/nlsh-<timestamp>.log` for appending.
    pub fn create(dir: &Path, started: &DateTime<FixedOffset>, stderr: Box<dyn Write>) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
        let path = dir.join(log_file_name(started));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open session log {}", path.display()))?;
        Ok(Self {
            path: Some(path),
            file: Some(file),
            stderr,
        })
    }

    /// Like [`SessionLog::create`], but degrade to stderr-only logging on failure.
    pub fn create_or_stderr(dir: &Path, started: &DateTime<FixedOffset>, stderr: Box<dyn Write>) -> Self {
        match Self::create(dir, started, Box::new(std::io::sink())) {
            Ok(log) => Self { stderr, ..log },
            Err(err) => {
                warn!(err = %format!("{err:#}"), "session log unavailable, using stderr");
                let mut log = Self::stderr_only(stderr);
                log.write_stderr(&format!("warning: {err:#}; logging to stderr\n"));
                log
            }
        }
    }

    pub fn stderr_only(stderr: Box<dyn Write>) -> Self {
        Self {
            path: None,
            file: None,
            stderr,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one record stamped with the current local time.
    ///
    /// With `mirror`, the record is also written to stderr. A failed file
    /// write falls back to stderr and never aborts the caller.
    pub fn append(&mut self, kind: RecordKind, message: &str, mirror: bool) {
        let now = Local::now().fixed_offset();
        self.append_at(&now, kind, message, mirror);
    }

    pub fn append_at(
        &mut self,
        at: &DateTime<FixedOffset>,
        kind: RecordKind,
        message: &str,
        mirror: bool,
    ) {
        let record = format_record(at, kind, message);
        let written = match self.file.as_mut() {
            Some(file) => match file.write_all(record.as_bytes()) {
                Ok(()) => true,
                Err(err) => {
                    warn!(err = %err, "failed to append to session log");
                    false
                }
            },
            None => false,
        };
        if mirror || !written {
            self.write_stderr(&record);
        }
    }

    fn write_stderr(&mut self, text: &str) {
        if let Err(err) = self
            .stderr
            .write_all(text.as_bytes())
            .and_then(|()| self.stderr.flush())
        {
            warn!(err = %err, "failed to write log record to stderr");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuffer;

    fn at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-18T09:30:05+02:00").expect("timestamp")
    }

    #[test]
    fn record_is_timestamped_and_tagged() {
        let record = format_record(&at(), RecordKind::GoalReceived, "list files");
        assert_eq!(record, "2026-10-18T09:30:05+02:00 [goal] list files\n");
    }

    #[test]
    fn continuation_lines_are_indented() {
        let record = format_record(&at(), RecordKind::CommandExecuted, "command: ls\noutput:\na.txt");
        assert_eq!(
            record,
            "2026-10-18T09:30:05+02:00 [executed] command: ls\n  output:\n  a.txt\n"
        );
    }

    #[test]
    fn file_name_uses_start_time() {
        assert_eq!(log_file_name(&at()), "nlsh-20261018-093005.log");
    }

    #[test]
    fn appends_records_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stderr = SharedBuffer::default();
        let mut log =
            SessionLog::create(&temp.path().join("logs"), &at(), Box::new(stderr.clone())).expect("create");
        log.append_at(&at(), RecordKind::Lifecycle, "session started", false);
        log.append_at(&at(), RecordKind::Refusal, "declined", false);

        let path = log.path().expect("path").to_path_buf();
        assert!(path.ends_with("logs/nlsh-20261018-093005.log"));
        let contents = fs::read_to_string(path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[lifecycle] session started"));
        assert!(lines[1].ends_with("[refusal] declined"));
        assert!(stderr.contents().is_empty());
    }

    #[test]
    fn mirror_copies_record_to_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stderr = SharedBuffer::default();
        let mut log = SessionLog::create(temp.path(), &at(), Box::new(stderr.clone())).expect("create");
        log.append_at(&at(), RecordKind::ApiCall, "request sent", true);
        assert_eq!(stderr.contents(), "2026-10-18T09:30:05+02:00 [api] request sent\n");
    }

    #[test]
    fn unwritable_dir_degrades_to_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").expect("write blocker");
        let stderr = SharedBuffer::default();

        let mut log = SessionLog::create_or_stderr(&blocker.join("logs"), &at(), Box::new(stderr.clone()));
        assert!(log.path().is_none());
        log.append_at(&at(), RecordKind::Error, "backend down", false);

        let printed = stderr.contents();
        assert!(printed.contains("logging to stderr"));
        assert!(printed.contains("[error] backend down"));
    }
}
