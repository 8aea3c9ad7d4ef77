//! I/O adapters: configuration, terminal, backend, interpreter and log sink.

pub mod config;
pub mod console;
pub mod model;
pub mod process;
pub mod prompt;
pub mod session_log;
pub mod terminal;
