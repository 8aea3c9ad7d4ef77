//! Test-only helpers: scripted collaborators and captured output streams.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use anyhow::{Result, anyhow};
use chrono::Local;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::mode::SessionFlags;
use crate::io::console::Console;
use crate::io::model::{ModelBackend, ModelSettings, RawResponse};
use crate::io::process::Interpreter;
use crate::io::session_log::SessionLog;
use crate::io::terminal::{ConfirmPrompt, GoalSource};
use crate::session::Session;

/// In-memory writer whose contents stay readable after it is boxed away.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console writing to two shared buffers: `(console, stdout, stderr)`.
pub fn capture_console() -> (Console, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let console = Console::new(Box::new(out.clone()), Box::new(err.clone()));
    (console, out, err)
}

/// Session logging into a temp dir, with mirrored records captured.
pub struct TestSession {
    pub session: Session,
    pub stderr: SharedBuffer,
    _dir: TempDir,
}

impl TestSession {
    pub fn new(flags: SessionFlags) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let stderr = SharedBuffer::default();
        let log = SessionLog::create(
            dir.path(),
            &Local::now().fixed_offset(),
            Box::new(stderr.clone()),
        )
        .expect("create session log");
        Self {
            session: Session::new(flags, log),
            stderr,
            _dir: dir,
        }
    }

    pub fn log_text(&self) -> String {
        let path = self.session.log_path().expect("session log path");
        fs::read_to_string(path).expect("read session log")
    }
}

pub fn test_settings() -> ModelSettings {
    ModelSettings {
        model: "gpt-test".to_string(),
        temperature: 0.2,
        max_tokens: 150,
    }
}

/// Chat-completions body whose first choice carries `content`.
pub fn completion_body(content: &str) -> String {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
        .to_string()
}

/// Backend that replays queued responses and records every payload.
pub struct ScriptedBackend {
    responses: RefCell<VecDeque<Result<RawResponse, String>>>,
    requests: RefCell<Vec<Vec<u8>>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<RawResponse, String>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn ok(body: &str) -> Result<RawResponse, String> {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Result<RawResponse, String> {
        Ok(RawResponse {
            status,
            body: body.to_string(),
        })
    }

    pub fn transport_error(message: &str) -> Result<RawResponse, String> {
        Err(message.to_string())
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<Value> {
        self.requests
            .borrow()
            .last()
            .and_then(|payload| serde_json::from_slice(payload).ok())
    }
}

impl ModelBackend for ScriptedBackend {
    fn send(&self, payload: &[u8]) -> Result<RawResponse> {
        self.requests.borrow_mut().push(payload.to_vec());
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted backend response left")),
        }
    }
}

/// One scripted interpreter run.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRun {
    pub chunks: Vec<String>,
    pub status: i32,
    pub spawn_error: Option<String>,
}

impl ScriptedRun {
    pub fn lines(lines: &[&str], status: i32) -> Self {
        Self::chunks(lines, status)
    }

    /// Output delivered in arbitrary pieces, as a pipe read may split it.
    pub fn chunks(chunks: &[&str], status: i32) -> Self {
        Self {
            chunks: chunks.iter().map(|chunk| (*chunk).to_string()).collect(),
            status,
            spawn_error: None,
        }
    }

    pub fn spawn_failure(message: &str) -> Self {
        Self {
            spawn_error: Some(message.to_string()),
            ..Self::default()
        }
    }
}

/// Interpreter that records commands instead of running them.
///
/// Runs beyond the script produce no output and exit 0.
pub struct ScriptedInterpreter {
    runs: RefCell<VecDeque<ScriptedRun>>,
    commands: RefCell<Vec<String>>,
}

impl ScriptedInterpreter {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            commands: RefCell::new(Vec::new()),
        }
    }

    /// Every command passed to `eval`, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl Interpreter for ScriptedInterpreter {
    fn eval(&self, command: &str, on_output: &mut dyn FnMut(&str)) -> Result<i32> {
        self.commands.borrow_mut().push(command.to_string());
        let run = self.runs.borrow_mut().pop_front().unwrap_or_default();
        if let Some(message) = run.spawn_error {
            return Err(anyhow!(message));
        }
        for chunk in &run.chunks {
            on_output(chunk);
        }
        Ok(run.status)
    }
}

/// Confirmation prompt answering from a queue. An exhausted queue is end of input.
pub struct ScriptedConfirm {
    answers: RefCell<VecDeque<Option<String>>>,
    questions: RefCell<Vec<String>>,
    failure: Option<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: Vec<Option<String>>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            questions: RefCell::new(Vec::new()),
            failure: None,
        }
    }

    /// Prompt that fails on every call, like a session without a terminal.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn asked(&self) -> usize {
        self.questions.borrow().len()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

impl ConfirmPrompt for ScriptedConfirm {
    fn ask(&self, question: &str) -> Result<Option<String>> {
        self.questions.borrow_mut().push(question.to_string());
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        Ok(self.answers.borrow_mut().pop_front().flatten())
    }
}

/// Goal source replaying fixed lines, then end of input.
pub struct ScriptedGoals {
    lines: VecDeque<String>,
}

impl ScriptedGoals {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|line| (*line).to_string()).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl GoalSource for ScriptedGoals {
    fn read_goal(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
