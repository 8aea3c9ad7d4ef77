//! Operator-facing output streams.

use std::io::{self, Write};

use anyhow::{Context, Result};

/// Stdout/stderr pair the pipeline writes to.
///
/// Held as trait objects so tests can capture both streams.
pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Console {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { out, err }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Informational line on stdout.
    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}").context("write stdout")?;
        self.out.flush().context("flush stdout")
    }

    /// Diagnostic line on stderr.
    pub fn warn(&mut self, line: &str) -> Result<()> {
        writeln!(self.err, "{line}").context("write stderr")?;
        self.err.flush().context("flush stderr")
    }

    /// Raw text on stdout; a trailing newline is added if missing.
    pub fn print_block(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).context("write stdout")?;
        if !text.ends_with('\n') {
            self.out.write_all(b"\n").context("write stdout")?;
        }
        self.out.flush().context("flush stdout")
    }

    /// Raw text on stderr, flushed immediately for live streaming.
    pub fn stream_err(&mut self, text: &str) -> Result<()> {
        self.err.write_all(text.as_bytes()).context("write stderr")?;
        self.err.flush().context("flush stderr")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuffer;

    #[test]
    fn print_block_terminates_last_line() {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let mut console = Console::new(Box::new(out.clone()), Box::new(err.clone()));

        console.print_block("a\nb").expect("print");
        console.print_block("c\n").expect("print");
        console.warn("careful").expect("warn");

        assert_eq!(out.contents(), "a\nb\nc\n");
        assert_eq!(err.contents(), "careful\n");
    }
}
