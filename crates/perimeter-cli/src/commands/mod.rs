//! Command handlers for the `perimeter` CLI.

pub mod config;
pub mod snapshot;
