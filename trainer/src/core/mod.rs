//! Deterministic, pure logic shared by the trainer.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod extract;
pub mod motions;
pub mod types;
