//! Recorded operation traces
//!
//! A trace is a TOML document describing a starting repository, the stream of
//! client operations seen on the share, and what the repository should look
//! like afterwards:
//!
//! ```toml
//! name = "word 2003 save"
//!
//! [[seed]]
//! path = '\docs\report.doc'
//! content = "v1"
//! properties = { author = "ada" }
//!
//! [[step]]
//! op = "create"
//! path = '\docs\~WRD0001.TMP'
//!
//! [[expect]]
//! path = '\docs\report.doc'
//! content = "v2"
//! same_node_as = '\docs\report.doc'
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use shuffle_model::OpenFileMode;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A file present before the first step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedFile {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// One client action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum TraceStep {
    Create {
        path: String,
    },
    Delete {
        path: String,
    },
    Rename {
        from: String,
        to: String,
    },
    Move {
        from: String,
        to: String,
    },
    Open {
        path: String,
        #[serde(default = "default_open_mode")]
        mode: OpenFileMode,
        #[serde(default)]
        truncate: bool,
    },
    Close {
        path: String,
    },
    /// Content written through an open handle; never reaches the engine
    Write {
        path: String,
        content: String,
    },
}

fn default_open_mode() -> OpenFileMode {
    OpenFileMode::ReadWrite
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path } => write!(f, "create {path}"),
            Self::Delete { path } => write!(f, "delete {path}"),
            Self::Rename { from, to } => write!(f, "rename {from} -> {to}"),
            Self::Move { from, to } => write!(f, "move {from} -> {to}"),
            Self::Open { path, mode, .. } => write!(f, "open {path} ({mode:?})"),
            Self::Close { path } => write!(f, "close {path}"),
            Self::Write { path, .. } => write!(f, "write {path}"),
        }
    }
}

/// State a path must be in once the trace has run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Expectation {
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Seed path whose node must now live at `path`
    #[serde(default)]
    pub same_node_as: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub absent: bool,
}

/// A complete trace document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "seed")]
    pub seeds: Vec<SeedFile>,
    #[serde(default, rename = "step")]
    pub steps: Vec<TraceStep>,
    #[serde(default, rename = "expect")]
    pub expectations: Vec<Expectation>,
}

impl Trace {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a trace file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::TraceNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Display name, falling back to `fallback` for unnamed traces
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r#"
name = "sample"

[[seed]]
path = '\docs\a.txt'
content = "v1"
properties = { author = "ada" }

[[step]]
op = "open"
path = '\docs\a.txt'

[[step]]
op = "open"
path = '\docs\a.txt'
mode = "read-only"

[[step]]
op = "rename"
from = '\docs\a.txt'
to = '\docs\b.txt'

[[step]]
op = "write"
path = '\docs\b.txt'
content = "v2"

[[expect]]
path = '\docs\b.txt'
content = "v2"
same_node_as = '\docs\a.txt'

[[expect]]
path = '\docs\a.txt'
absent = true
"#;

    #[test]
    fn test_parse_full_trace() {
        let trace = Trace::parse(SAMPLE).unwrap();
        assert_eq!(trace.name.as_deref(), Some("sample"));
        assert_eq!(trace.seeds.len(), 1);
        assert_eq!(trace.seeds[0].properties.get("author").map(String::as_str), Some("ada"));
        assert_eq!(
            trace.steps[0],
            TraceStep::Open {
                path: r"\docs\a.txt".to_string(),
                mode: OpenFileMode::ReadWrite,
                truncate: false,
            }
        );
        assert!(matches!(
            trace.steps[1],
            TraceStep::Open {
                mode: OpenFileMode::ReadOnly,
                ..
            }
        ));
        assert_eq!(trace.expectations.len(), 2);
        assert!(trace.expectations[1].absent);
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = Trace::parse("[[step]]\nop = \"truncate\"\npath = 'a'\n").unwrap_err();
        assert!(matches!(err, Error::TomlDe(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let trace = Trace::load(file.path()).unwrap();
        assert_eq!(trace.display_name("fallback"), "sample");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Trace::load(Path::new("/nonexistent/trace.toml")).unwrap_err();
        assert!(matches!(err, Error::TraceNotFound { .. }));
    }

    #[test]
    fn test_step_display() {
        let step = TraceStep::Rename {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert_eq!(step.to_string(), "rename a -> b");
    }
}
