//! Rules file parsing

use crate::error::{Error, Result};
use crate::scenario::{Ranking, ScenarioKind};
use crate::session::{DEFAULT_SESSION_CAPACITY, SessionContext};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_pattern() -> String {
    ".*".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_capacity() -> usize {
    DEFAULT_SESSION_CAPACITY
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One `[[scenario]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub kind: ScenarioKind,

    /// Case-insensitive regular expression matched against the whole name
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Overrides the kind's default ranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Ranking>,

    /// Overrides the kind's default timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_enabled", skip_serializing_if = "is_true")]
    pub enabled: bool,
}

impl ScenarioConfig {
    pub fn new(kind: ScenarioKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            ranking: None,
            timeout_secs: None,
            enabled: true,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn effective_ranking(&self) -> Ranking {
        self.ranking.unwrap_or_else(|| self.kind.default_ranking())
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.kind.default_timeout())
    }
}

/// The `[session]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Entries kept in the session store before the oldest is evicted
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// A parsed rules file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioConfig>,
}

impl RulesConfig {
    /// Parse a rules file from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use shuffle_rules::config::RulesConfig;
    ///
    /// let config = RulesConfig::parse(r#"
    /// [[scenario]]
    /// kind = "rename-shuffle"
    /// pattern = '.*~'
    /// "#).unwrap();
    ///
    /// assert_eq!(config.scenarios.len(), 1);
    /// assert_eq!(config.session.capacity, 64);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let config: RulesConfig = toml::from_str(content)?;
        if config.session.capacity == 0 {
            return Err(Error::InvalidCapacity { capacity: 0 });
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::RulesNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `path` when given, otherwise the shipped rules
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// The shipped rules, in evaluation order.
    ///
    /// The broad delete trackers come first so that the more specific
    /// shuffles after them win ties at equal ranking. Locked-delete parks any
    /// delete in its folder, so the save shuffles that answer their own
    /// trailing deletes follow it.
    pub fn builtin() -> Self {
        use ScenarioKind as K;

        let scenarios = vec![
            ScenarioConfig::new(K::DeleteRestore, ".*").with_timeout_secs(5),
            ScenarioConfig::new(K::DeleteRenameOrCreate, r".*\.(rtf|rtfd|txt|pages|numbers|key)")
                .with_timeout_secs(5),
            ScenarioConfig::new(K::LockedDeleteShuffle, r"~\$.*").with_timeout_secs(1800),
            ScenarioConfig::new(K::CreateShuffle, r"~WRD.*\.TMP").with_timeout_secs(30),
            ScenarioConfig::new(K::DoubleRenameShuffle, r"[0-9A-F]{6,8}\.tmp").with_timeout_secs(30),
            ScenarioConfig::new(K::DoubleRenameShuffle, r".*\.backup\.fm").with_timeout_secs(30),
            ScenarioConfig::new(K::MultiRenameShuffle, r"Word Work File D_[0-9]+\.tmp")
                .with_timeout_secs(30),
            ScenarioConfig::new(K::RenameShuffle, ".*~").with_timeout_secs(30),
            ScenarioConfig::new(K::RenameDeleteMove, r".*\.sb-[0-9a-f]+-[0-9a-z]+")
                .with_timeout_secs(30),
            ScenarioConfig::new(K::TempDeleteShuffle, r".*[\\/]\.TemporaryItems[\\/].*")
                .with_timeout_secs(30),
            ScenarioConfig::new(K::OpenFile, ".*"),
            ScenarioConfig::new(K::Default, ".*"),
        ];

        Self {
            session: SessionConfig::default(),
            scenarios,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A fresh session sized by the `[session]` section
    pub fn session_context(&self) -> SessionContext {
        SessionContext::with_capacity(self.session.capacity)
    }

    /// Enabled entries in evaluation order
    pub fn enabled(&self) -> impl Iterator<Item = &ScenarioConfig> {
        self.scenarios.iter().filter(|entry| entry.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_applies_defaults() {
        let config = RulesConfig::parse(
            r#"
[[scenario]]
kind = "open-file"
"#,
        )
        .unwrap();

        assert_eq!(config.session.capacity, DEFAULT_SESSION_CAPACITY);
        let entry = &config.scenarios[0];
        assert_eq!(entry.pattern, ".*");
        assert!(entry.enabled);
        assert_eq!(entry.effective_ranking(), Ranking::Medium);
    }

    #[test]
    fn test_parse_overrides() {
        let config = RulesConfig::parse(
            r#"
[session]
capacity = 8

[[scenario]]
kind = "rename-shuffle"
pattern = '.*\.bak'
ranking = "medium"
timeout_secs = 2
enabled = false
"#,
        )
        .unwrap();

        assert_eq!(config.session.capacity, 8);
        let entry = &config.scenarios[0];
        assert_eq!(entry.kind, ScenarioKind::RenameShuffle);
        assert_eq!(entry.effective_ranking(), Ranking::Medium);
        assert_eq!(entry.effective_timeout(), Duration::from_secs(2));
        assert_eq!(config.enabled().count(), 0);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = RulesConfig::parse(
            r#"
[[scenario]]
kind = "teleport-shuffle"
"#,
        );
        assert!(matches!(result, Err(Error::TomlDe(_))));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = RulesConfig::parse("[session]\ncapacity = 0\n");
        assert!(matches!(result, Err(Error::InvalidCapacity { capacity: 0 })));
    }

    #[test]
    fn test_builtin_round_trips_through_toml() {
        let builtin = RulesConfig::builtin();
        let parsed = RulesConfig::parse(&builtin.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, builtin);
    }

    #[test]
    fn test_shipped_rules_file_matches_builtin() {
        let shipped = include_str!("../../../../test-fixtures/rules/default.toml");
        assert_eq!(RulesConfig::parse(shipped).unwrap(), RulesConfig::builtin());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[scenario]]\nkind = \"default\"").unwrap();

        let config = RulesConfig::load(file.path()).unwrap();
        assert_eq!(config.scenarios.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RulesConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(Error::RulesNotFound { .. })));
    }

    #[test]
    fn test_load_or_builtin_without_path() {
        assert_eq!(RulesConfig::load_or_builtin(None).unwrap(), RulesConfig::builtin());
    }
}
