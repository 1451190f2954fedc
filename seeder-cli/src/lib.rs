//! Command-line front end for the seeder.
//!
//! The binary wires a directory of definitions, a JSON state file and the
//! built-in [`catalog`] of item types into a [`seeder::SeedRunner`].

pub mod catalog;
pub mod exit_codes;
pub mod render;
