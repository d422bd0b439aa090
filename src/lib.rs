// ABOUTME: Library root for rollcheck - exposes the status-check engine and config.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod status;
pub mod types;
