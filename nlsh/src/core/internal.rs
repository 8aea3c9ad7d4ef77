//! Internal commands intercepted before any model call.

use crate::core::mode::Mode;

/// An utterance handled by the mediator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalCommand {
    /// Blank input: return to the prompt without doing anything.
    Blank,
    /// `exit` or `quit`.
    Exit,
    /// `set debug=on|off` or `set confirmation=on|off`.
    Set { mode: Mode, enabled: bool },
}

/// Recognize an internal command in an already-trimmed goal.
///
/// Matching is exact and case-sensitive; anything unrecognized is a goal for
/// the model.
pub fn parse_internal(goal: &str) -> Option<InternalCommand> {
    let command = match goal {
        "" => InternalCommand::Blank,
        "exit" | "quit" => InternalCommand::Exit,
        "set debug=on" => InternalCommand::Set {
            mode: Mode::Debug,
            enabled: true,
        },
        "set debug=off" => InternalCommand::Set {
            mode: Mode::Debug,
            enabled: false,
        },
        "set confirmation=on" => InternalCommand::Set {
            mode: Mode::Confirmation,
            enabled: true,
        },
        "set confirmation=off" => InternalCommand::Set {
            mode: Mode::Confirmation,
            enabled: false,
        },
        _ => return None,
    };
    Some(command)
}
