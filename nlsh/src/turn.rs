//! Orchestration for a single turn: one operator utterance from intake to log.

use std::fmt;

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::confirm::parse_answer;
use crate::core::internal::{InternalCommand, parse_internal};
use crate::core::mode::ModeChange;
use crate::core::types::{ConfirmationDecision, ModelResult, on_off};
use crate::execute::execute;
use crate::io::console::Console;
use crate::io::model::{ChatRequest, ModelBackend, ModelSettings, query};
use crate::io::process::Interpreter;
use crate::io::prompt::render_system_instruction;
use crate::io::session_log::RecordKind;
use crate::io::terminal::ConfirmPrompt;
use crate::session::Session;

const DECLINED_NOTICE: &str = "The model declined this goal as unsafe or infeasible:";
const NOT_EXECUTED_NOTICE: &str = "Command not executed.";

/// Collaborators a turn needs besides the session and console.
pub struct TurnContext<'a, B, I, C> {
    pub backend: &'a B,
    pub interpreter: &'a I,
    pub confirm: &'a C,
    pub settings: &'a ModelSettings,
}

/// Why a turn was abandoned before anything was executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The request body could not be built; no network call was made.
    Payload(String),
    /// The backend could not be reached or did not answer.
    Transport(String),
    /// The backend answered with an error payload.
    Api(String),
    /// The response carried no usable completion.
    EmptyCompletion,
    /// The interpreter could not be started.
    Spawn(String),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Payload(detail) => {
                write!(f, "Internal error while building the request: {detail}")
            }
            TurnError::Transport(detail) => {
                write!(f, "Request to the model backend failed: {detail}")
            }
            TurnError::Api(message) => write!(f, "OpenAI API returned an error: {message}"),
            TurnError::EmptyCompletion => {
                write!(f, "Failed to extract a command from the API response.")
            }
            TurnError::Spawn(detail) => write!(f, "Failed to run command: {detail}"),
        }
    }
}

impl std::error::Error for TurnError {}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// `exit` or `quit`.
    Terminate,
    /// Blank input; nothing happened.
    Skipped,
    /// A `set` command was applied (or was already in effect).
    ModeCommand(ModeChange),
    /// Reported, logged, and dropped. The session continues.
    Abandoned(TurnError),
    /// The model returned the refusal sentinel and only the sentinel ran.
    Refused { exit_status: i32 },
    /// The operator declined the candidate command.
    Rejected { command: String },
    /// The candidate command ran.
    Executed {
        command: String,
        decision: ConfirmationDecision,
        exit_status: i32,
    },
}

/// Process one raw utterance.
///
/// Internal commands are intercepted before any model call. A model-generated
/// command is only ever evaluated after classification and the confirmation
/// gate. Errors returned from here are console failures; everything else is
/// folded into [`TurnOutcome`].
#[instrument(skip_all)]
pub fn run_turn<B: ModelBackend, I: Interpreter, C: ConfirmPrompt>(
    raw_goal: &str,
    session: &mut Session,
    console: &mut Console,
    ctx: &TurnContext<'_, B, I, C>,
) -> Result<TurnOutcome> {
    let goal = raw_goal.trim();
    if let Some(internal) = parse_internal(goal) {
        return handle_internal(internal, session, console);
    }

    session.record(RecordKind::GoalReceived, goal);

    let request = match build_request(ctx.settings, goal) {
        Ok(request) => request,
        Err(err) => return abandon(session, console, TurnError::Payload(format!("{err:#}"))),
    };
    let result = match query(ctx.backend, session, &request) {
        Ok(result) => result,
        Err(err) => return abandon(session, console, TurnError::Transport(format!("{err:#}"))),
    };

    match result {
        ModelResult::ApiError(message) => abandon(session, console, TurnError::Api(message)),
        ModelResult::Empty => abandon(session, console, TurnError::EmptyCompletion),
        ModelResult::Refusal(sentinel) => run_refusal(&sentinel, goal, session, console, ctx),
        ModelResult::Command(command) => gate_and_execute(command, session, console, ctx),
    }
}

fn handle_internal(
    internal: InternalCommand,
    session: &mut Session,
    console: &mut Console,
) -> Result<TurnOutcome> {
    match internal {
        InternalCommand::Blank => Ok(TurnOutcome::Skipped),
        InternalCommand::Exit => Ok(TurnOutcome::Terminate),
        InternalCommand::Set { mode, enabled } => {
            let change = session.set_mode(mode, enabled);
            console.say(&change.message())?;
            Ok(TurnOutcome::ModeCommand(change))
        }
    }
}

fn build_request(settings: &ModelSettings, goal: &str) -> Result<ChatRequest> {
    let system_instruction = render_system_instruction()?;
    let request = ChatRequest::new(settings, &system_instruction, goal);
    // Encode once up front so a malformed body never reaches the network.
    request.encode()?;
    Ok(request)
}

fn abandon(session: &mut Session, console: &mut Console, error: TurnError) -> Result<TurnOutcome> {
    let message = error.to_string();
    debug!(error = %message, "turn abandoned");
    session.record(RecordKind::Error, &message);
    console.warn(&message)?;
    Ok(TurnOutcome::Abandoned(error))
}

fn run_refusal<B, I: Interpreter, C>(
    sentinel: &str,
    goal: &str,
    session: &mut Session,
    console: &mut Console,
    ctx: &TurnContext<'_, B, I, C>,
) -> Result<TurnOutcome> {
    info!("model declined goal");
    console.say(DECLINED_NOTICE)?;
    // The sentinel is a fixed inert echo, so it bypasses the gate.
    let outcome = match execute(ctx.interpreter, sentinel, session, console) {
        Ok(outcome) => outcome,
        Err(err) => return abandon(session, console, TurnError::Spawn(format!("{err:#}"))),
    };
    session.record(
        RecordKind::Refusal,
        &format!(
            "goal declined: {goal}\nexit status: {}\noutput:\n{}",
            outcome.exit_status,
            outcome.output.log_text()
        ),
    );
    Ok(TurnOutcome::Refused {
        exit_status: outcome.exit_status,
    })
}

fn gate_and_execute<B, I: Interpreter, C: ConfirmPrompt>(
    command: String,
    session: &mut Session,
    console: &mut Console,
    ctx: &TurnContext<'_, B, I, C>,
) -> Result<TurnOutcome> {
    session.record(RecordKind::CommandExtracted, &command);

    let confirm_mode = session.flags().confirm;
    let decision = if confirm_mode {
        ask_operator(&command, session, console, ctx.confirm)?
    } else {
        ConfirmationDecision::NotRequired
    };
    session.record(
        RecordKind::Confirmation,
        &format!(
            "{} (confirmation mode {}): {command}",
            decision.as_str(),
            on_off(confirm_mode)
        ),
    );

    if !decision.allows_execution() {
        console.say(NOT_EXECUTED_NOTICE)?;
        return Ok(TurnOutcome::Rejected { command });
    }

    let outcome = match execute(ctx.interpreter, &command, session, console) {
        Ok(outcome) => outcome,
        Err(err) => return abandon(session, console, TurnError::Spawn(format!("{err:#}"))),
    };
    session.record(
        RecordKind::CommandExecuted,
        &format!(
            "command: {command}\nconfirmation mode: {}\nexit status: {}\noutput:\n{}",
            on_off(confirm_mode),
            outcome.exit_status,
            outcome.output.log_text()
        ),
    );
    Ok(TurnOutcome::Executed {
        command,
        decision,
        exit_status: outcome.exit_status,
    })
}

/// Show the exact command on the controlling terminal and wait for an answer.
///
/// End of input or an unusable terminal counts as rejection.
fn ask_operator<C: ConfirmPrompt>(
    command: &str,
    session: &mut Session,
    console: &mut Console,
    confirm: &C,
) -> Result<ConfirmationDecision> {
    let question = format!("Proposed command:\n  {command}\nExecute this command? [y/N] ");
    match confirm.ask(&question) {
        Ok(Some(answer)) => Ok(parse_answer(&answer)),
        Ok(None) => Ok(ConfirmationDecision::Rejected),
        Err(err) => {
            let message = format!("Confirmation prompt unavailable: {err:#}");
            session.record(RecordKind::Error, &message);
            console.warn(&message)?;
            Ok(ConfirmationDecision::Rejected)
        }
    }
}
