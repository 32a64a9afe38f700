//! Debate practice coach backed by an LLM chat-completion API.
//!
//! Given a motion, the trainer asks the model for arguments in favour,
//! opponent arguments against, AI rebuttals, and scores for a human rebuttal.
//! Every model answer is parsed defensively into typed records with bounded
//! retries. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (data model, JSON extraction,
//!   motions). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (HTTP completions, config files,
//!   prompt templates). Isolated behind traits to enable fakes in tests.
//!
//! [`generate`] implements the structured generation client; [`coach`]
//! parameterizes it for the four debate operations over a [`session`].

pub mod coach;
pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
pub mod practice;
pub mod render;
pub mod schema;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
