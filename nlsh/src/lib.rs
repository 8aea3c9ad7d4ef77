//! Natural-language shell mediator.
//!
//! An operator states a goal in plain language, a chat-completions backend
//! turns it into one command line, and the mediator gates that command behind
//! classification and (optional) operator confirmation before the host shell
//! evaluates it. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (response classification, internal
//!   commands, confirmation answers, mode flags). No I/O.
//! - **[`io`]**: Side-effecting adapters (HTTP backend, shell interpreter,
//!   terminal input, session log, config). Behind traits where tests need to
//!   script them.
//!
//! Orchestration modules ([`turn`], [`execute`], [`shell`]) coordinate core
//! logic with I/O to implement the interactive session.

pub mod core;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
pub mod shell;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
