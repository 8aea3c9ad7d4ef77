//! Interactive read loop driving [`run_turn`] until the operator leaves.

use anyhow::Result;
use tracing::debug;

use crate::core::types::on_off;
use crate::io::console::Console;
use crate::io::model::ModelBackend;
use crate::io::process::Interpreter;
use crate::io::session_log::RecordKind;
use crate::io::terminal::{ConfirmPrompt, GoalSource};
use crate::session::Session;
use crate::turn::{TurnContext, TurnOutcome, run_turn};

/// Prompt shown by the line editor.
pub const PROMPT: &str = "nlsh> ";

/// Reason why `run_shell` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStop {
    /// The goal source reached end of input.
    EndOfInput,
    /// The operator typed `exit` or `quit`.
    ExitCommand,
}

/// Summary of an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutcome {
    /// Lines read from the goal source, including blank and internal ones.
    pub turns: u32,
    pub stop: ShellStop,
}

/// Read utterances and run one turn each, strictly in sequence.
///
/// A new line is never read before the previous turn's records are written.
/// Only end of input or `exit`/`quit` end the loop; per-turn failures do not.
pub fn run_shell<S, B, I, C>(
    source: &mut S,
    session: &mut Session,
    console: &mut Console,
    ctx: &TurnContext<'_, B, I, C>,
) -> Result<ShellOutcome>
where
    S: GoalSource,
    B: ModelBackend,
    I: Interpreter,
    C: ConfirmPrompt,
{
    let flags = session.flags();
    session.record(
        RecordKind::Lifecycle,
        &format!(
            "session started (model {}, debug {}, confirmation {})",
            ctx.settings.model,
            on_off(flags.debug),
            on_off(flags.confirm)
        ),
    );
    let log_location = session
        .log_path()
        .map_or_else(|| "stderr".to_string(), |path| path.display().to_string());
    console.say(&format!(
        "Describe what you want to do; `exit` or `quit` leaves. Session log: {log_location}"
    ))?;

    let mut turns = 0u32;
    let stop = loop {
        let Some(raw_goal) = source.read_goal()? else {
            break ShellStop::EndOfInput;
        };
        turns += 1;
        let outcome = run_turn(&raw_goal, session, console, ctx)?;
        debug!(turn = turns, outcome = ?outcome, "turn finished");
        if outcome == TurnOutcome::Terminate {
            break ShellStop::ExitCommand;
        }
    };

    let reason = match stop {
        ShellStop::EndOfInput => "end of input",
        ShellStop::ExitCommand => "exit requested",
    };
    session.record(
        RecordKind::Lifecycle,
        &format!("session ended ({reason}) after {turns} turns"),
    );
    Ok(ShellOutcome { turns, stop })
}
