//! Error types for shuffle-model

/// Result type for repository command execution
pub type Result<T> = std::result::Result<T, Error>;

/// Errors an executor reports while applying commands
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No node at {path}")]
    NotFound { path: String },

    #[error("A node already exists at {path}")]
    AlreadyExists { path: String },

    #[error("Node {node} is not in the archive")]
    NotArchived { node: String },

    #[error("Stale file handle for {path}")]
    StaleHandle { path: String },

    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },
}

impl Error {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }
}
