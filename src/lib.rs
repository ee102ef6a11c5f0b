// ABOUTME: Library root for krouo - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod knock;
pub mod ssh;
pub mod types;
