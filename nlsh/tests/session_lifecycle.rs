//! Session-level tests driving the shell loop through several turns.
//!
//! These use the real shell interpreter with scripted backend, goal and
//! confirmation sources to verify end-to-end behavior: gating, execution,
//! exit-status capture and the records left in the session log.

#![cfg(unix)]

use nlsh::core::classifier::REFUSAL_SENTINEL;
use nlsh::core::mode::SessionFlags;
use nlsh::core::types::ConfirmationDecision;
use nlsh::io::process::ShellInterpreter;
use nlsh::shell::{ShellStop, run_shell};
use nlsh::test_support::{
    ScriptedBackend, ScriptedConfirm, ScriptedGoals, TestSession, capture_console,
    completion_body, test_settings,
};
use nlsh::turn::{TurnContext, TurnOutcome, run_turn};

fn sh() -> ShellInterpreter {
    ShellInterpreter::locate("sh").expect("sh available")
}

/// Goal → `ls -la` → confirmation on, operator answers `y` → one executed record.
#[test]
fn approved_listing_runs_and_logs_exit_status() {
    let mut test = TestSession::new(SessionFlags {
        debug: false,
        confirm: true,
    });
    let (mut console, out, _) = capture_console();
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok(&completion_body("ls -la"))]);
    let interpreter = sh();
    let confirm = ScriptedConfirm::new(vec![Some("y\n".to_string())]);
    let settings = test_settings();
    let ctx = TurnContext {
        backend: &backend,
        interpreter: &interpreter,
        confirm: &confirm,
        settings: &settings,
    };

    let outcome = run_turn(
        "list files in the current directory",
        &mut test.session,
        &mut console,
        &ctx,
    )
    .expect("turn");

    assert_eq!(
        outcome,
        TurnOutcome::Executed {
            command: "ls -la".to_string(),
            decision: ConfirmationDecision::Approved,
            exit_status: 0
        }
    );
    assert_eq!(confirm.asked(), 1);
    assert!(out.contents().contains("total"));
    let log = test.log_text();
    assert_eq!(log.matches("[executed]").count(), 1);
    assert!(log.contains("[executed] command: ls -la\n  confirmation mode: on\n  exit status: 0"));
    assert!(log.contains("[confirm] approved (confirmation mode on): ls -la"));
}

/// Goal → refusal sentinel → only the sentinel runs, no prompt, refusal record.
#[test]
fn refusal_prints_declined_message_and_echo() {
    let mut test = TestSession::new(SessionFlags {
        debug: false,
        confirm: true,
    });
    let (mut console, out, _) = capture_console();
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok(&completion_body(REFUSAL_SENTINEL))]);
    let interpreter = sh();
    let confirm = ScriptedConfirm::new(Vec::new());
    let settings = test_settings();
    let ctx = TurnContext {
        backend: &backend,
        interpreter: &interpreter,
        confirm: &confirm,
        settings: &settings,
    };

    let outcome =
        run_turn("wipe the root filesystem", &mut test.session, &mut console, &ctx).expect("turn");

    assert_eq!(outcome, TurnOutcome::Refused { exit_status: 0 });
    assert_eq!(confirm.asked(), 0);
    let printed = out.contents();
    assert!(printed.contains("declined"));
    assert!(printed.contains(
        "Error: Task is too risky or requires manual intervention (e.g., reboot, live environment)."
    ));
    let log = test.log_text();
    assert!(log.contains("[refusal] goal declined: wipe the root filesystem"));
    assert!(!log.contains("[executed]"));
}

/// Quiet mode: the logged status is the command's own, output captured verbatim.
#[test]
fn quiet_mode_logs_real_status_and_verbatim_output() {
    let mut test = TestSession::new(SessionFlags {
        debug: false,
        confirm: false,
    });
    let (mut console, out, err) = capture_console();
    let command = r#"printf '%s|%s\n' "a  b" c; echo oops 1>&2; exit 3"#;
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok(&completion_body(&format!(
        "\n{command}  \n"
    )))]);
    let interpreter = sh();
    let confirm = ScriptedConfirm::new(Vec::new());
    let settings = test_settings();
    let ctx = TurnContext {
        backend: &backend,
        interpreter: &interpreter,
        confirm: &confirm,
        settings: &settings,
    };

    let outcome = run_turn("print a table and fail", &mut test.session, &mut console, &ctx).expect("turn");

    assert_eq!(
        outcome,
        TurnOutcome::Executed {
            command: command.to_string(),
            decision: ConfirmationDecision::NotRequired,
            exit_status: 3
        }
    );
    assert_eq!(out.contents(), "a  b|c\noops\n");
    assert_eq!(err.contents(), "Command failed with exit status 3.\n");
    let log = test.log_text();
    assert!(log.contains("exit status: 3\n  output:\n  a  b|c\n  oops\n"));
}

/// Verbose mode streams output to stderr, logs it live, and still reports status.
#[test]
fn verbose_mode_streams_and_logs_payload_summary() {
    let mut test = TestSession::new(SessionFlags {
        debug: true,
        confirm: false,
    });
    let (mut console, out, err) = capture_console();
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok(&completion_body(
        "echo first; echo second; exit 2",
    ))]);
    let interpreter = sh();
    let confirm = ScriptedConfirm::new(Vec::new());
    let settings = test_settings();
    let ctx = TurnContext {
        backend: &backend,
        interpreter: &interpreter,
        confirm: &confirm,
        settings: &settings,
    };

    let outcome = run_turn("print my secret plan", &mut test.session, &mut console, &ctx).expect("turn");

    assert!(matches!(outcome, TurnOutcome::Executed { exit_status: 2, .. }));
    assert!(out.contents().is_empty());
    assert_eq!(err.contents(), "first\nsecond\n");
    let log = test.log_text();
    assert!(log.contains("[output] first"));
    assert!(log.contains("[output] second"));
    assert!(log.contains("exit status: 2\n  output:\n  (streamed)"));
    assert!(log.contains("[api] payload: "));
    assert!(log.contains("<redacted>"));
    assert!(!log.contains(r#""content":"print my secret plan""#));
    assert!(log.contains("[api] response: "));
    assert!(test.stderr.contents().contains("[executed] command: echo first"));
}

/// Several turns in one session: errors and rejections never end the loop.
#[test]
fn session_survives_failures_until_end_of_input() {
    let mut test = TestSession::new(SessionFlags {
        debug: false,
        confirm: true,
    });
    let (mut console, out, err) = capture_console();
    let mut goals = ScriptedGoals::new(&[
        "show the date",
        "   ",
        "remove the build dir",
        "set confirmation=off",
        "set confirmation=off",
        "say hello",
    ]);
    let backend = ScriptedBackend::new(vec![
        ScriptedBackend::status(429, r#"{"error":{"message":"rate limited"}}"#),
        ScriptedBackend::ok(&completion_body("rm -r build")),
        ScriptedBackend::ok(&completion_body("echo hello")),
    ]);
    let interpreter = sh();
    let confirm = ScriptedConfirm::new(vec![Some("no\n".to_string())]);
    let settings = test_settings();
    let ctx = TurnContext {
        backend: &backend,
        interpreter: &interpreter,
        confirm: &confirm,
        settings: &settings,
    };

    let outcome = run_shell(&mut goals, &mut test.session, &mut console, &ctx).expect("shell");

    assert_eq!(outcome.stop, ShellStop::EndOfInput);
    assert_eq!(outcome.turns, 6);
    assert_eq!(backend.calls(), 3);
    assert_eq!(confirm.asked(), 1);
    assert!(!test.session.flags().confirm);

    assert!(err.contents().contains("OpenAI API returned an error: rate limited"));
    let printed = out.contents();
    assert!(printed.contains("Command not executed."));
    assert_eq!(printed.matches("Confirmation mode disabled.").count(), 1);
    assert_eq!(printed.matches("Confirmation mode is already off.").count(), 1);
    assert!(printed.ends_with("hello\n"));

    let log = test.log_text();
    assert_eq!(log.matches("[goal]").count(), 3);
    assert_eq!(log.matches("confirmation mode set to off").count(), 1);
    assert_eq!(log.matches("[executed]").count(), 1);
    assert!(log.contains("[executed] command: echo hello"));
    assert!(log.contains("[lifecycle] session ended (end of input) after 6 turns"));
}
