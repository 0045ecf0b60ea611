//! Process exit codes.

/// Everything succeeded (accepted, already solved, or all datasets passed).
pub const OK: i32 = 0;

/// The work ran but the result is negative: rejected guess, rate limit,
/// failing or timed-out datasets.
pub const FAILED: i32 = 1;

/// Bad arguments, missing credentials, unreadable store.
pub const CONFIG_ERROR: i32 = 2;
