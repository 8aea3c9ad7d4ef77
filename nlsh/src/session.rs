//! Session state: mode flags plus the log sink, alive for the whole run.

use std::path::Path;

use crate::core::mode::{Mode, ModeChange, SessionFlags};
use crate::core::types::on_off;
use crate::io::session_log::{RecordKind, SessionLog};

pub struct Session {
    flags: SessionFlags,
    log: SessionLog,
}

impl Session {
    pub fn new(flags: SessionFlags, log: SessionLog) -> Self {
        Self { flags, log }
    }

    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.path()
    }

    /// Apply a `set` command. Only an actual change is logged.
    pub fn set_mode(&mut self, mode: Mode, enabled: bool) -> ModeChange {
        let change = self.flags.set(mode, enabled);
        if change.is_change() {
            self.record(
                RecordKind::Lifecycle,
                &format!("{} mode set to {}", mode.label(), on_off(enabled)),
            );
        }
        change
    }

    /// Append a record, mirrored to stderr while debug mode is on.
    pub fn record(&mut self, kind: RecordKind, message: &str) {
        self.log.append(kind, message, self.flags.debug);
    }

    /// Append one line of live command output. Never mirrored: verbose
    /// execution already streams it to stderr.
    pub fn record_output(&mut self, line: &str) {
        self.log.append(RecordKind::CommandOutput, line, false);
    }
}
