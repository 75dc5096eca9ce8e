//! Save-shuffle CLI
//!
//! Replays recorded client traces through the rule engine and inspects rules
//! files.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    if let Err(e) = shuffle_rules::logging::init(level) {
        eprintln!("{} could not initialise logging: {}", "warning:".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} save-shuffle rules", "shuffle".green().bold());
            println!();
            println!("Run {} for available commands.", "shuffle --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Replay { trace, rules, json } => {
            commands::run_replay(&trace, rules.as_deref(), json)
        }
        Commands::Scenarios { rules, json } => commands::run_scenarios(rules.as_deref(), json),
        Commands::Check { rules } => commands::run_check(&rules),
        Commands::DefaultRules => commands::run_default_rules(),
    }
}
