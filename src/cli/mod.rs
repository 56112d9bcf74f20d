//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Hygeia using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Hygeia - hospitalization record collection and enrichment
#[derive(Parser, Debug)]
#[command(name = "hygeia")]
#[command(version, about, long_about = None)]
#[command(author = "Hygeia Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hygeia.toml", env = "HYGEIA_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HYGEIA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect and enrich one hospitalization record by card number
    Fetch(commands::fetch::FetchArgs),

    /// List a patient's hospitalizations with confirmed operations
    List(commands::list::ListArgs),

    /// Download reference handbooks and persist them locally
    SyncHandbooks(commands::sync::SyncHandbooksArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
