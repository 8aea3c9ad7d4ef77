//! Shared deterministic types for the turn pipeline.
//!
//! These types define stable contracts between the model client, the
//! confirmation gate and the execution adapter.

/// Classified result of one model backend round trip.
///
/// Exactly one variant is produced per turn, at the classification boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResult {
    /// A candidate command line, trimmed. Untrusted until it passes the gate.
    Command(String),
    /// The model emitted the refusal sentinel verbatim.
    Refusal(String),
    /// The backend returned an error payload.
    ApiError(String),
    /// Nothing usable could be extracted from the response.
    Empty,
}

/// Outcome of the confirmation gate for a candidate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    /// Confirmation mode was off when the command reached the gate.
    NotRequired,
    /// The operator explicitly approved the command.
    Approved,
    /// The operator answered anything other than yes.
    Rejected,
}

impl ConfirmationDecision {
    pub fn allows_execution(self) -> bool {
        !matches!(self, ConfirmationDecision::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationDecision::NotRequired => "not required",
            ConfirmationDecision::Approved => "approved",
            ConfirmationDecision::Rejected => "rejected",
        }
    }
}

/// How the execution adapter presents command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream each line to stderr and the session log as it is produced.
    Verbose,
    /// Buffer everything and print once after the command exits.
    Quiet,
}

impl OutputMode {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            OutputMode::Verbose
        } else {
            OutputMode::Quiet
        }
    }
}

/// Render a flag the way the operator types it (`on`/`off`).
pub fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
