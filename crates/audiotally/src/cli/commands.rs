//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Override the project sample rate in Hz (persisted for the next run)
    #[arg(short, long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Emit status updates as JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

/// Calc command arguments.
#[derive(Debug, Args)]
pub struct CalcCommand {
    /// Override the project sample rate in Hz (persisted for the next run)
    #[arg(short, long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip restoring the original clipboard contents afterwards
    #[arg(long)]
    pub no_restore: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Set and persist the project sample rate
    SetSampleRate {
        /// Sample rate in Hz (e.g. 44100, 48000, 96000)
        #[arg(value_name = "HZ")]
        rate: u32,
    },
}
