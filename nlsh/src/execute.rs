//! Execution adapter: runs an approved command and presents its output.

use anyhow::Result;

use crate::core::types::OutputMode;
use crate::io::console::Console;
use crate::io::process::Interpreter;
use crate::session::Session;

/// Output captured for the command-executed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedOutput {
    /// Verbose mode: lines were streamed and logged as they arrived.
    Streamed,
    /// Quiet mode: everything the command printed, in production order.
    Buffered(String),
}

impl CapturedOutput {
    /// Text for the log record, with explicit markers instead of empty output.
    pub fn log_text(&self) -> &str {
        match self {
            CapturedOutput::Streamed => "(streamed)",
            CapturedOutput::Buffered(text) if text.is_empty() => "(no output)",
            CapturedOutput::Buffered(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub exit_status: i32,
    pub output: CapturedOutput,
}

/// Evaluate `command` once and present its output per the session's mode.
///
/// Verbose: output goes to stderr as it is produced; the session log gets it
/// one line at a time.
/// Quiet: output is buffered and printed once if non-empty; a non-zero status
/// gets a short notice on stderr.
pub fn execute<I: Interpreter>(
    interpreter: &I,
    command: &str,
    session: &mut Session,
    console: &mut Console,
) -> Result<ExecOutcome> {
    match session.flags().output_mode() {
        OutputMode::Verbose => {
            let mut write_err = None;
            let mut partial = String::new();
            let exit_status = interpreter.eval(command, &mut |chunk: &str| {
                if write_err.is_none()
                    && let Err(err) = console.stream_err(chunk)
                {
                    write_err = Some(err);
                }
                partial.push_str(chunk);
                while let Some(end) = partial.find('\n') {
                    let line: String = partial.drain(..=end).collect();
                    session.record_output(line.trim_end_matches(['\r', '\n']));
                }
            })?;
            if !partial.is_empty() {
                session.record_output(partial.trim_end_matches('\r'));
            }
            if let Some(err) = write_err {
                return Err(err);
            }
            Ok(ExecOutcome {
                exit_status,
                output: CapturedOutput::Streamed,
            })
        }
        OutputMode::Quiet => {
            let mut buffer = String::new();
            let exit_status = interpreter.eval(command, &mut |chunk: &str| buffer.push_str(chunk))?;
            if !buffer.is_empty() {
                console.print_block(&buffer)?;
            }
            if exit_status != 0 {
                console.warn(&format!("Command failed with exit status {exit_status}."))?;
            }
            Ok(ExecOutcome {
                exit_status,
                output: CapturedOutput::Buffered(buffer),
            })
        }
    }
}
