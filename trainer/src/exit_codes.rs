//! Stable exit codes for trainer CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// A generation or transport failure, or any other runtime error.
pub const FAILED: i32 = 1;
/// Invalid configuration or missing API credential. No request was made.
pub const CONFIG: i32 = 2;
