//! Command handlers.
//!
//! Each handler takes the validated configuration, wires what it needs
//! through `zimage_axum::bootstrap`, and formats the outcome for the
//! terminal. Failures are returned as [`CliError`](crate::CliError) inside
//! `anyhow::Error` so `main` can pick the exit code.

pub mod check;
pub mod config;
pub mod generate;
pub mod serve;
