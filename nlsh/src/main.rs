//! Natural-language shell mediator.
//!
//! Reads goals at an interactive prompt, asks a chat-completions backend for a
//! single command line, and runs it through the host shell after the safety
//! and confirmation gate. Every turn is recorded in a per-run session log.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};

use nlsh::core::mode::SessionFlags;
use nlsh::exit_codes;
use nlsh::io::config::{NlshConfig, default_config_path, load_config, read_api_key};
use nlsh::io::console::Console;
use nlsh::io::model::{HttpBackend, ModelSettings};
use nlsh::io::process::{ShellInterpreter, guard_interrupts};
use nlsh::io::session_log::{RecordKind, SessionLog};
use nlsh::io::terminal::{LineEditor, TtyPrompt};
use nlsh::logging;
use nlsh::session::Session;
use nlsh::shell::{PROMPT, run_shell};
use nlsh::turn::TurnContext;

#[derive(Parser)]
#[command(
    name = "nlsh",
    version,
    about = "Translate plain-language goals into shell commands, with a confirmation gate"
)]
struct Cli {
    /// Stream command output live and mirror log records to stderr (same as --debug=on).
    #[arg(short, long)]
    verbose: bool,

    /// Debug/verbose mode. Takes precedence over -v.
    #[arg(long, value_enum, value_name = "on|off", require_equals = true)]
    debug: Option<Toggle>,

    /// Ask before executing each generated command.
    #[arg(long, value_enum, value_name = "on|off", require_equals = true)]
    confirm: Option<Toggle>,

    /// Config file (default: <config dir>/nlsh/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        self == Toggle::On
    }
}

impl Cli {
    /// Start-up flags layered over the config file.
    fn session_flags(&self, cfg: &NlshConfig) -> SessionFlags {
        let debug = match self.debug {
            Some(toggle) => toggle.enabled(),
            None => self.verbose || cfg.debug,
        };
        let confirm = self.confirm.map_or(cfg.confirm, Toggle::enabled);
        SessionFlags { debug, confirm }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_codes::FAILURE
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1; --help and --version are not errors.
            let code = if err.use_stderr() {
                exit_codes::FAILURE
            } else {
                exit_codes::OK
            };
            err.print().context("print usage")?;
            return Ok(code);
        }
    };
    logging::init();

    let cfg = match cli.config.clone().or_else(default_config_path) {
        Some(path) => load_config(&path)?,
        None => NlshConfig::default(),
    };
    let flags = cli.session_flags(&cfg);

    let api_key = read_api_key(&cfg.api_key_env)?;
    let interpreter = ShellInterpreter::locate(&cfg.shell)?;
    guard_interrupts()?;
    let backend = HttpBackend::new(
        &cfg.endpoint,
        api_key,
        Duration::from_secs(cfg.request_timeout_secs),
    )?;
    let settings = ModelSettings {
        model: cfg.model.clone(),
        temperature: cfg.temperature,
        max_tokens: cfg.max_tokens,
    };

    let log = SessionLog::create_or_stderr(
        &cfg.resolved_log_dir(),
        &Local::now().fixed_offset(),
        Box::new(std::io::stderr()),
    );
    let mut session = Session::new(flags, log);
    session.record(
        RecordKind::Lifecycle,
        &format!("interpreter {}", interpreter.shell().display()),
    );
    let mut console = Console::stdio();
    let mut editor = LineEditor::new(PROMPT)?;
    let confirm = TtyPrompt::controlling();
    let ctx = TurnContext {
        backend: &backend,
        interpreter: &interpreter,
        confirm: &confirm,
        settings: &settings,
    };

    run_shell(&mut editor, &mut session, &mut console, &ctx)?;
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_no_flags_uses_config() {
        let cli = Cli::parse_from(["nlsh"]);
        let cfg = NlshConfig {
            debug: false,
            confirm: true,
            ..NlshConfig::default()
        };
        assert_eq!(
            cli.session_flags(&cfg),
            SessionFlags {
                debug: false,
                confirm: true
            }
        );
    }

    #[test]
    fn parse_verbose_and_confirm_off() {
        let cli = Cli::parse_from(["nlsh", "-v", "--confirm=off"]);
        assert_eq!(
            cli.session_flags(&NlshConfig::default()),
            SessionFlags {
                debug: true,
                confirm: false
            }
        );
        let cli = Cli::parse_from(["nlsh", "--verbose"]);
        assert!(cli.session_flags(&NlshConfig::default()).debug);
    }

    #[test]
    fn explicit_debug_wins_over_verbose() {
        let cli = Cli::parse_from(["nlsh", "-v", "--debug=off"]);
        assert!(!cli.session_flags(&NlshConfig::default()).debug);
        let cli = Cli::parse_from(["nlsh", "--debug=on"]);
        let cfg = NlshConfig {
            debug: false,
            ..NlshConfig::default()
        };
        assert!(cli.session_flags(&cfg).debug);
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let err = Cli::try_parse_from(["nlsh", "--turbo"])
            .err()
            .expect("unknown flag rejected");
        assert!(err.use_stderr());
    }

    #[test]
    fn toggles_require_equals_syntax() {
        assert!(Cli::try_parse_from(["nlsh", "--debug", "on"]).is_err());
        assert!(Cli::try_parse_from(["nlsh", "--confirm=maybe"]).is_err());
    }
}
