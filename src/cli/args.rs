//! CLI argument definitions using clap
//!
//! Commands:
//! - docwire compile --config <path>
//! - docwire explain --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docwire - compile relational queries into document store queries
#[derive(Parser, Debug)]
#[command(name = "docwire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one request from stdin and print the descriptor
    Compile {
        /// Path to configuration file
        #[arg(long, default_value = "./docwire.json")]
        config: PathBuf,
    },

    /// Compile one request from stdin and print a readable explanation
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./docwire.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
