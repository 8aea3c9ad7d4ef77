//! Command interpreter adapter: evaluates a command line through the host shell.

use std::ffi::OsStr;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info, instrument};

const READ_CHUNK: usize = 4096;

/// Abstraction over the host command interpreter.
pub trait Interpreter {
    /// Evaluate `command` exactly once.
    ///
    /// `on_output` receives combined stdout/stderr in production order, in
    /// chunks as they become available. A chunk may end mid-line, so a prompt
    /// without a trailing newline is delivered before the command reads its
    /// answer. Returns the exit status of the evaluated command itself.
    fn eval(&self, command: &str, on_output: &mut dyn FnMut(&str)) -> Result<i32>;
}

/// Interpreter that runs `<shell> -c <command>`.
#[derive(Debug, Clone)]
pub struct ShellInterpreter {
    shell: PathBuf,
}

impl ShellInterpreter {
    /// Resolve `shell` (absolute/relative path or a name on `PATH`).
    ///
    /// Fails when the interpreter cannot be found, which is a start-up error.
    pub fn locate(shell: &str) -> Result<Self> {
        let path_var = std::env::var_os("PATH");
        let shell = resolve_program(shell, path_var.as_deref())
            .ok_or_else(|| anyhow!("required interpreter `{shell}` not found"))?;
        debug!(shell = %shell.display(), "located interpreter");
        Ok(Self { shell })
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }
}

impl Interpreter for ShellInterpreter {
    #[instrument(skip_all, fields(shell = %self.shell.display()))]
    fn eval(&self, command: &str, on_output: &mut dyn FnMut(&str)) -> Result<i32> {
        let interrupted = interrupt_flag()?;
        interrupted.store(false, Ordering::SeqCst);

        // stdout and stderr share one pipe so lines interleave as produced.
        let (reader, writer) = std::io::pipe().context("create output pipe")?;
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdout(writer.try_clone().context("clone output pipe")?)
            .stderr(writer);

        debug!("spawning interpreter");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "failed to spawn interpreter");
                return Err(e).with_context(|| format!("spawn {}", self.shell.display()));
            }
        };
        // The parent's copies of the write end must close before EOF can arrive.
        drop(cmd);

        let read_result = forward_output(reader, on_output);
        let status = child.wait().context("wait for interpreter")?;
        read_result?;

        let code = exit_code(status);
        if interrupted.swap(false, Ordering::SeqCst) {
            info!(exit_code = code, "interrupt received while command was running");
        }
        debug!(exit_code = code, "command finished");
        Ok(code)
    }
}

/// Process-wide SIGINT flag.
///
/// Registering a handler replaces the default disposition, so Ctrl-C aimed at
/// a running command stops the child (whose handlers reset on exec) but not
/// the mediator.
fn interrupt_flag() -> Result<&'static Arc<AtomicBool>> {
    static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();
    if let Some(flag) = FLAG.get() {
        return Ok(flag);
    }
    let flag = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))
        .context("install interrupt handler")?;
    Ok(FLAG.get_or_init(|| flag))
}

/// Install the interrupt handler ahead of the first command.
pub fn guard_interrupts() -> Result<()> {
    interrupt_flag().map(|_| ())
}

fn forward_output<R: Read>(mut reader: R, on_output: &mut dyn FnMut(&str)) -> Result<()> {
    let mut chunk = [0_u8; READ_CHUNK];
    let mut pending = Vec::new();
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("read command output"),
        };
        pending.extend_from_slice(&chunk[..n]);
        let ready = decodable_len(&pending);
        if ready > 0 {
            on_output(&String::from_utf8_lossy(&pending[..ready]));
            pending.drain(..ready);
        }
    }
    if !pending.is_empty() {
        on_output(&String::from_utf8_lossy(&pending));
    }
    Ok(())
}

/// Length of the prefix that can be decoded now; a multi-byte character cut
/// at the end of a read waits for its remaining bytes.
fn decodable_len(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        _ => bytes.len(),
    }
}

/// Exit status as a shell would report it: signals map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or_else(|| signal_code(status))
}

#[cfg(unix)]
fn signal_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_code(_status: ExitStatus) -> i32 {
    1
}

fn resolve_program(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    std::env::split_paths(path_var?)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}
