//! Open-file handles supplied by the protocol layer

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// How a file is being opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenFileMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    /// Opened only so that it can be deleted
    Delete,
    /// Opened only to query or set attributes
    AttributesOnly,
}

impl OpenFileMode {
    /// Whether the open grants write access to content
    pub fn is_write(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

/// Capabilities the engine needs from a protocol-layer open file.
pub trait NetworkFile: Send + Sync + fmt::Debug {
    /// File name (final path component)
    fn name(&self) -> &str;

    /// Full protocol path of the file
    fn full_path(&self) -> &str;

    /// Whether the handle was granted read-only access
    fn is_read_only(&self) -> bool;

    /// Whether the file must be deleted when the handle is closed
    fn has_delete_on_close(&self) -> bool;
}

/// Shared reference to an open file.
///
/// Two handles are equal only when they refer to the same underlying open
/// file object.
#[derive(Clone)]
pub struct FileHandle(Arc<dyn NetworkFile>);

impl FileHandle {
    pub fn new(file: impl NetworkFile + 'static) -> Self {
        Self(Arc::new(file))
    }

    pub fn from_arc(file: Arc<dyn NetworkFile>) -> Self {
        Self(file)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn full_path(&self) -> &str {
        self.0.full_path()
    }

    pub fn is_read_only(&self) -> bool {
        self.0.is_read_only()
    }

    pub fn has_delete_on_close(&self) -> bool {
        self.0.has_delete_on_close()
    }

    /// Access the protocol-layer object behind the handle
    pub fn file(&self) -> &Arc<dyn NetworkFile> {
        &self.0
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FileHandle {}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileHandle").field(&self.0).finish()
    }
}

impl Serialize for FileHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.full_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fake {
        path: String,
    }

    impl NetworkFile for Fake {
        fn name(&self) -> &str {
            crate::path::file_name(&self.path)
        }
        fn full_path(&self) -> &str {
            &self.path
        }
        fn is_read_only(&self) -> bool {
            true
        }
        fn has_delete_on_close(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_handle_equality_is_identity() {
        let a = FileHandle::new(Fake {
            path: r"\a.txt".into(),
        });
        let b = FileHandle::new(Fake {
            path: r"\a.txt".into(),
        });

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.name(), "a.txt");
    }

    #[test]
    fn test_handle_serializes_as_path() {
        let a = FileHandle::new(Fake {
            path: r"\a.txt".into(),
        });
        assert_eq!(serde_json::to_string(&a).unwrap(), r#""\\a.txt""#);
    }

    #[test]
    fn test_write_modes() {
        assert!(OpenFileMode::ReadWrite.is_write());
        assert!(OpenFileMode::WriteOnly.is_write());
        assert!(!OpenFileMode::ReadOnly.is_write());
        assert!(!OpenFileMode::AttributesOnly.is_write());
    }
}
