//! Stable exit codes for roundtable CLI commands.

/// Command succeeded, or `roundtable run` ended because a role terminated it.
pub const OK: i32 = 0;
/// Command failed due to invalid layout/config/plan/state or other errors.
pub const INVALID: i32 = 1;
/// `roundtable run` stopped because the round limit was reached.
pub const ROUND_LIMIT: i32 = 2;
