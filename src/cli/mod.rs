//! Command-line interface for seqpicker.
//!
//! Provides commands for selecting representatives and scoring existing
//! selections.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
