//! Side-effecting adapters: definition sources, step repositories and
//! configuration files.

pub mod config;
pub mod repository;
pub mod source;
