//! Ordered, idempotent data seeding from declarative step definitions.
//!
//! A seed is a set of steps, each an `order`, a name, an item type and a
//! list of items. The runner loads every definition, validates the set
//! against what already ran, then hands each item of every due step to the
//! handler registered for its type and records the step as complete. A
//! completed step never runs again; editing its definition afterwards is
//! detected through a whitespace-insensitive content hash.
//!
//! - **[`core`]**: Pure, deterministic logic (hashing, decoding, validation
//!   rules, status merging). No I/O.
//! - **[`io`]**: Definition sources, step repositories, configuration.
//!
//! Orchestration modules ([`load`], [`execute`], [`runner`]) coordinate
//! core logic with I/O; [`registry`] is the table of seedable item types.

pub mod core;
pub mod error;
pub mod execute;
pub mod io;
pub mod load;
pub mod logging;
pub mod registry;
pub mod runner;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::report::{ErrorCode, KeyCode, Violations};
pub use crate::core::types::{IgnoreSettings, StepStatus, StepSummary};
pub use crate::error::SeedError;
pub use crate::registry::ItemRegistry;
pub use crate::runner::SeedRunner;
