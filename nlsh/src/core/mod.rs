//! Deterministic, pure logic shared by the turn pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (operator input, backend response bodies, session flags) and return
//! deterministic outputs suitable for tests.

pub mod classifier;
pub mod confirm;
pub mod internal;
pub mod mode;
pub mod types;
