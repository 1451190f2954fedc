//! Deterministic, pure logic shared by the seeder.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod decode;
pub mod hash;
pub mod report;
pub mod selector;
pub mod summary;
pub mod types;
pub mod validate;
