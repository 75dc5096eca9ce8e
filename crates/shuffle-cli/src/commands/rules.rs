//! Rules inspection commands

use colored::Colorize;
use serde::Serialize;
use shuffle_rules::{Ranking, RuleEvaluator, RulesConfig, ScenarioKind};
use std::path::Path;

use crate::error::{CliError, Result};

/// One row of the scenario listing
#[derive(Debug, Serialize)]
struct ScenarioRow {
    kind: ScenarioKind,
    pattern: String,
    ranking: Ranking,
    timeout_secs: u64,
    enabled: bool,
}

/// Run the scenarios command
pub fn run_scenarios(rules: Option<&Path>, json: bool) -> Result<()> {
    let config = RulesConfig::load_or_builtin(rules)?;
    let rows: Vec<ScenarioRow> = config
        .scenarios
        .iter()
        .map(|entry| ScenarioRow {
            kind: entry.kind,
            pattern: entry.pattern.clone(),
            ranking: entry.effective_ranking(),
            timeout_secs: entry.effective_timeout().as_secs(),
            enabled: entry.enabled,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let source = match rules {
        Some(path) => path.display().to_string(),
        None => "shipped rules".to_string(),
    };
    println!("{} ({})", "Scenarios".bold(), source.dimmed());
    println!();
    for (index, row) in rows.iter().enumerate() {
        let line = format!(
            "  {:>2}. {:<26} {:<8} {:>6}s  {}",
            index + 1,
            row.kind,
            row.ranking,
            row.timeout_secs,
            row.pattern
        );
        if row.enabled {
            println!("{line}");
        } else {
            println!("{} {}", line.dimmed(), "(disabled)".yellow());
        }
    }
    Ok(())
}

/// Run the check command
pub fn run_check(rules: &Path) -> Result<()> {
    let config = RulesConfig::load(rules)?;
    let enabled = config.enabled().count();
    if enabled == 0 {
        return Err(CliError::user(format!(
            "{} enables no scenarios",
            rules.display()
        )));
    }
    RuleEvaluator::from_config(&config)?;
    println!(
        "{} {} ({} scenarios, session capacity {})",
        "valid".green().bold(),
        rules.display(),
        enabled,
        config.session.capacity
    );
    Ok(())
}

/// Run the default-rules command
pub fn run_default_rules() -> Result<()> {
    print!("{}", RulesConfig::builtin().to_toml()?);
    Ok(())
}
