//! [`TestShare`]: a replayer over a fresh repository, with assertions.

use shuffle_model::NodeRef;
use shuffle_repo::{ReplayReport, Replayer, Trace};
use shuffle_rules::RulesConfig;
use std::fs;
use tempfile::TempDir;

/// A share backed by an in-memory repository.
///
/// # Example
///
/// ```rust
/// use shuffle_test_utils::TestShare;
///
/// let mut share = TestShare::new();
/// share.seed(r"\docs\a.txt", "v1");
/// share.replayer().rename(r"\docs\a.txt", r"\docs\b.txt");
/// share.assert_absent(r"\docs\a.txt");
/// share.assert_content(r"\docs\b.txt", "v1");
/// ```
pub struct TestShare {
    replayer: Replayer,
    /// Keeps a custom rules file alive for the share's lifetime.
    rules_dir: Option<TempDir>,
}

impl Default for TestShare {
    fn default() -> Self {
        Self::new()
    }
}

impl TestShare {
    /// A share using the shipped rules.
    pub fn new() -> Self {
        Self {
            replayer: Replayer::builtin().expect("TestShare::new: shipped rules must build"),
            rules_dir: None,
        }
    }

    /// A share using rules written to a temporary `rules.toml`.
    pub fn with_rules(rules: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(&path, rules).unwrap();
        let config = RulesConfig::load(&path)
            .unwrap_or_else(|e| panic!("TestShare::with_rules: invalid rules: {e}"));
        Self {
            replayer: Replayer::from_config(&config).unwrap(),
            rules_dir: Some(dir),
        }
    }

    pub fn replayer(&mut self) -> &mut Replayer {
        &mut self.replayer
    }

    /// Whether the share was built from a custom rules file.
    pub fn has_custom_rules(&self) -> bool {
        self.rules_dir.is_some()
    }

    /// Seed a file and return its node.
    pub fn seed(&mut self, path: &str, content: &str) -> NodeRef {
        self.replayer
            .seed(path, content.as_bytes())
            .unwrap_or_else(|e| panic!("Could not seed {path}: {e}"))
    }

    /// Replay a whole trace.
    pub fn replay(&mut self, trace: &Trace) -> ReplayReport {
        self.replayer
            .replay(trace)
            .unwrap_or_else(|e| panic!("Replay failed: {e}"))
    }

    /// Create, write and close a file in one go.
    pub fn write_new(&mut self, path: &str, content: &str) {
        let created = self.replayer.create(path);
        assert!(created.outcome.is_ok(), "create {path} failed: {:?}", created.outcome);
        self.replayer.repository().write(path, content.as_bytes()).unwrap();
        let closed = self.replayer.close(path).unwrap();
        assert!(closed.outcome.is_ok(), "close {path} failed: {:?}", closed.outcome);
    }

    /// # Panics
    /// Panics if `path` does not exist.
    pub fn assert_exists(&self, path: &str) {
        assert!(
            self.replayer.repository().exists(path),
            "Expected file to exist: {path}"
        );
    }

    /// # Panics
    /// Panics if `path` exists.
    pub fn assert_absent(&self, path: &str) {
        assert!(
            !self.replayer.repository().exists(path),
            "Expected file NOT to exist: {path}"
        );
    }

    /// # Panics
    /// Panics unless `path` holds exactly `content`.
    pub fn assert_content(&self, path: &str, content: &str) {
        let actual = self
            .replayer
            .repository()
            .content(path)
            .unwrap_or_else(|| panic!("Could not read file: {path}"));
        assert_eq!(
            String::from_utf8_lossy(&actual),
            content,
            "File {path} does not hold the expected content"
        );
    }

    /// # Panics
    /// Panics unless `path` is backed by `node`.
    pub fn assert_node(&self, path: &str, node: &NodeRef) {
        assert_eq!(
            self.replayer.repository().node_at(path).as_ref(),
            Some(node),
            "File {path} is not backed by node {node}"
        );
    }
}
