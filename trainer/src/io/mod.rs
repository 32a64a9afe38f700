//! I/O helpers: upstream completions, configuration, prompt templates.

pub mod completion;
pub mod config;
pub mod prompt;
