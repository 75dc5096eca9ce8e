//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Save-shuffle rules - detect application save patterns on a file share
#[derive(Parser, Debug)]
#[command(name = "shuffle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Replay a recorded operation trace against an in-memory repository
    ///
    /// Examples:
    ///   shuffle replay trace.toml
    ///   shuffle replay trace.toml --rules rules.toml --json
    Replay {
        /// Trace file to replay
        trace: PathBuf,

        /// Rules file (defaults to the shipped rules)
        #[arg(short, long, env = "SHUFFLE_RULES")]
        rules: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List configured scenarios in evaluation order
    Scenarios {
        /// Rules file (defaults to the shipped rules)
        #[arg(short, long, env = "SHUFFLE_RULES")]
        rules: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Validate a rules file
    Check {
        /// Rules file to validate
        rules: PathBuf,
    },

    /// Print the shipped rules as TOML
    DefaultRules,
}
