//! Opaque repository node references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a node in the backing repository.
///
/// The engine never interprets the value; it only carries it from the
/// protocol layer (share roots) or from executed commands (archived nodes)
/// back into later commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(String);

impl NodeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
