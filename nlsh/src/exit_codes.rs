//! Stable process exit codes for `nlsh`.

/// Normal termination: end of input, `exit` or `quit`.
pub const OK: i32 = 0;
/// Start-up failure: missing credential or interpreter, bad config, unknown flag.
pub const FAILURE: i32 = 1;
