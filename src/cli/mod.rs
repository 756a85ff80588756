//! CLI command handlers
//!
//! This module contains the clap argument definitions and the handler that
//! bridges them with the sync orchestrator.

pub mod args;
pub mod sync;

pub use args::Cli;
pub use sync::{handle_sync_command, run_with_connector};
