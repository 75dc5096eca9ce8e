//! Error types for shuffle-repo

use std::path::PathBuf;

/// Result type for shuffle-repo operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A trace closes a file it never opened
    #[error("No open handle for {path}")]
    NoOpenHandle { path: String },

    /// Trace file not found at the given path
    #[error("Trace not found at {path}")]
    TraceNotFound { path: PathBuf },

    /// A trace expectation did not hold
    #[error("Trace {name} failed: {failures} expectation(s) not met")]
    ExpectationsFailed { name: String, failures: usize },

    /// Repository error
    #[error(transparent)]
    Model(#[from] shuffle_model::Error),

    /// Rules could not be loaded or built
    #[error(transparent)]
    Rules(#[from] shuffle_rules::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
