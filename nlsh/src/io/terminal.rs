//! The two operator input sources.
//!
//! Goals come from the line editor (which may be fed by redirected input);
//! confirmation answers always come from the controlling terminal. Keeping
//! them behind separate traits stops a redirected goal stream from ever
//! answering the confirmation gate.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

/// Source of operator utterances.
pub trait GoalSource {
    /// Read the next raw line. `Ok(None)` signals end of input.
    fn read_goal(&mut self) -> Result<Option<String>>;
}

/// Source of yes/no answers for the confirmation gate.
pub trait ConfirmPrompt {
    /// Show `question` and read one answer line. `Ok(None)` signals end of input.
    fn ask(&self, question: &str) -> Result<Option<String>>;
}

/// Line editor with in-memory history.
pub struct LineEditor {
    editor: DefaultEditor,
    prompt: String,
}

impl LineEditor {
    pub fn new(prompt: &str) -> Result<Self> {
        let editor = DefaultEditor::new().context("initialize line editor")?;
        Ok(Self {
            editor,
            prompt: prompt.to_string(),
        })
    }
}

impl GoalSource for LineEditor {
    fn read_goal(&mut self) -> Result<Option<String>> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(err) = self.editor.add_history_entry(line.as_str())
                {
                    debug!(err = %err, "failed to record history entry");
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line only.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err).context("read goal"),
        }
    }
}

/// Confirmation prompt on the controlling terminal.
pub struct TtyPrompt {
    path: PathBuf,
}

impl TtyPrompt {
    pub fn controlling() -> Self {
        Self::at("/dev/tty")
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfirmPrompt for TtyPrompt {
    fn ask(&self, question: &str) -> Result<Option<String>> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut writer = tty.try_clone().context("clone terminal handle")?;
        write!(writer, "{question}").context("write confirmation prompt")?;
        writer.flush().context("flush confirmation prompt")?;

        let mut answer = String::new();
        let n = BufReader::new(tty)
            .read_line(&mut answer)
            .context("read confirmation answer")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(answer))
    }
}
