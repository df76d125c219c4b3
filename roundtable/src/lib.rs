//! Deterministic turn scheduling for a multi-role coding conversation.
//!
//! A plan document assigns subtasks to roles (planner, implementer, verifier,
//! fixer). From it the crate builds a fixed turn schedule and, given only the
//! number of messages exchanged so far, decides which role speaks next. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (plan codec, schedule, selection).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, config, process execution).
//!   Isolated to enable scripted executors in tests.
//!
//! Orchestration modules ([`planning`], [`conversation`], [`select`], [`validate`]) coordinate
//! core logic with I/O to implement CLI commands.

pub mod conversation;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod planning;
pub mod select;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
