//! Stable exit codes for `seeder` commands.

use seeder::SeedError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Definitions or recorded state were rejected (load or validation violations).
pub const REJECTED: i32 = 1;
/// A source, repository, config or handler failure aborted the command.
pub const FATAL: i32 = 2;

pub fn for_error(err: &SeedError) -> i32 {
    if err.is_rejected() { REJECTED } else { FATAL }
}
