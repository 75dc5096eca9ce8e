//! Builds scenarios from rules configuration

use crate::config::{RulesConfig, ScenarioConfig};
use crate::error::{Error, Result};
use crate::pattern::FilePattern;
use crate::scenario::{
    CreateShuffle, DefaultScenario, DeleteRenameOrCreate, DeleteRestore, DoubleRenameShuffle,
    LockedDeleteShuffle, MultiRenameShuffle, OpenFileScenario, RenameDeleteMove, RenameShuffle,
    Scenario, ScenarioKind, ScenarioSettings, TempDeleteShuffle,
};
use std::sync::Arc;
use tracing::debug;

/// Build every enabled scenario, in configuration order.
pub fn build_scenarios(config: &RulesConfig) -> Result<Vec<Arc<dyn Scenario>>> {
    config.enabled().map(build_scenario).collect()
}

/// Build one scenario from its configuration entry.
pub fn build_scenario(entry: &ScenarioConfig) -> Result<Arc<dyn Scenario>> {
    let pattern = FilePattern::new(&entry.pattern).map_err(|source| Error::InvalidPattern {
        kind: entry.kind,
        pattern: entry.pattern.clone(),
        source,
    })?;
    let settings = ScenarioSettings::new(pattern, entry.effective_ranking(), entry.effective_timeout());
    debug!(
        scenario = %entry.kind,
        pattern = %settings.pattern,
        ranking = %settings.ranking,
        "scenario loaded"
    );

    let scenario: Arc<dyn Scenario> = match entry.kind {
        ScenarioKind::CreateShuffle => Arc::new(CreateShuffle::new(settings)),
        ScenarioKind::DoubleRenameShuffle => Arc::new(DoubleRenameShuffle::new(settings)),
        ScenarioKind::MultiRenameShuffle => Arc::new(MultiRenameShuffle::new(settings)),
        ScenarioKind::RenameShuffle => Arc::new(RenameShuffle::new(settings)),
        ScenarioKind::DeleteRestore => Arc::new(DeleteRestore::new(settings)),
        ScenarioKind::DeleteRenameOrCreate => Arc::new(DeleteRenameOrCreate::new(settings)),
        ScenarioKind::LockedDeleteShuffle => Arc::new(LockedDeleteShuffle::new(settings)),
        ScenarioKind::TempDeleteShuffle => Arc::new(TempDeleteShuffle::new(settings)),
        ScenarioKind::RenameDeleteMove => Arc::new(RenameDeleteMove::new(settings)),
        ScenarioKind::OpenFile => Arc::new(OpenFileScenario::new(settings)),
        ScenarioKind::Default => Arc::new(DefaultScenario::new(settings)),
    };
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Ranking;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_builtin_builds_in_order() {
        let config = RulesConfig::builtin();
        let scenarios = build_scenarios(&config).unwrap();
        let kinds: Vec<_> = scenarios.iter().map(|s| s.kind()).collect();
        let expected: Vec<_> = config.scenarios.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn test_every_kind_is_buildable() {
        for kind in ScenarioKind::ALL {
            let scenario = build_scenario(&ScenarioConfig::new(kind, ".*")).unwrap();
            assert_eq!(scenario.kind(), kind);
            assert_eq!(scenario.settings().ranking, kind.default_ranking());
        }
    }

    #[test]
    fn test_disabled_entries_are_skipped() {
        let mut entry = ScenarioConfig::new(ScenarioKind::RenameShuffle, ".*~");
        entry.enabled = false;
        let config = RulesConfig {
            scenarios: vec![entry],
            ..RulesConfig::default()
        };
        assert!(build_scenarios(&config).unwrap().is_empty());
    }

    #[test]
    fn test_overrides_reach_settings() {
        let mut entry = ScenarioConfig::new(ScenarioKind::CreateShuffle, "a").with_timeout_secs(7);
        entry.ranking = Some(Ranking::Low);
        let scenario = build_scenario(&entry).unwrap();
        assert_eq!(scenario.settings().timeout, Duration::from_secs(7));
        assert_eq!(scenario.settings().ranking, Ranking::Low);
    }

    #[test]
    fn test_invalid_pattern_names_the_scenario() {
        let entry = ScenarioConfig::new(ScenarioKind::RenameShuffle, "(unclosed");
        let err = build_scenario(&entry).err().unwrap();
        assert!(matches!(
            err,
            Error::InvalidPattern { kind: ScenarioKind::RenameShuffle, .. }
        ));
        assert_eq!(err.to_string(), "Invalid pattern for rename-shuffle: (unclosed");
    }
}
