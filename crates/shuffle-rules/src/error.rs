//! Error types for shuffle-rules

use crate::scenario::ScenarioKind;
use std::path::PathBuf;

/// Result type for shuffle-rules operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading rules. Evaluation itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scenario pattern is not a valid regular expression
    #[error("Invalid pattern for {kind}: {pattern}")]
    InvalidPattern {
        kind: ScenarioKind,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The session store cannot hold any entries
    #[error("Invalid session capacity: {capacity}")]
    InvalidCapacity { capacity: usize },

    /// Rules file not found at the given path
    #[error("Rules not found at {path}")]
    RulesNotFound { path: PathBuf },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}
