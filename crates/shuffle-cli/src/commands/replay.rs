//! Replay a recorded trace

use colored::Colorize;
use shuffle_repo::{ReplayReport, Replayer, Trace};
use shuffle_rules::RulesConfig;
use std::path::Path;

use crate::error::Result;

/// Run the replay command
pub fn run_replay(trace_path: &Path, rules: Option<&Path>, json: bool) -> Result<()> {
    let trace = Trace::load(trace_path)?;
    let config = RulesConfig::load_or_builtin(rules)?;
    let mut replayer = Replayer::from_config(&config)?;
    let report = replayer.replay(&trace)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, trace.expectations.len());
    }

    report.ensure_passed()?;
    Ok(())
}

fn print_report(report: &ReplayReport, expectations: usize) {
    println!(
        "{} {} ({} steps)",
        "Replaying".bold(),
        report.name.cyan(),
        report.steps.len()
    );
    println!();

    for (index, record) in report.steps.iter().enumerate() {
        let outcome = match (&record.command, &record.error) {
            (_, Some(error)) => format!("{} {}", "failed:".red(), error),
            (Some(command), None) => command.label().green().to_string(),
            (None, None) => "content written".dimmed().to_string(),
        };
        println!("  {:>3}. {:<60} {}", index + 1, record.step, outcome);
    }

    println!();
    println!("{}", "Repository".bold());
    for entry in &report.listing {
        println!(
            "  {:<50} v{:<3} {:>6} bytes  {}",
            entry.path,
            entry.version,
            entry.size,
            entry.checksum[..12].dimmed()
        );
    }
    if !report.live_instances.is_empty() {
        println!();
        println!("{}", "Live instances".bold());
        for summary in &report.live_instances {
            println!(
                "  {:<24} {:<8} {}",
                summary.kind.as_str().cyan(),
                summary.ranking,
                summary.subject.as_deref().unwrap_or("-")
            );
        }
    }

    println!();
    if report.passed() {
        println!(
            "{} all {} expectations met",
            "OK".green().bold(),
            expectations
        );
    } else {
        for failure in &report.failures {
            println!("  {} {}", "x".red().bold(), failure);
        }
    }
}
