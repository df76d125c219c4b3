//! Deterministic, pure logic shared by the roundtable core.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod plan;
pub mod role;
pub mod schedule;
pub mod selector;
pub mod stop;
pub mod types;
pub mod xml;
