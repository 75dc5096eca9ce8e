//! Filesystem operations reported by the protocol layer
//!
//! One `Operation` is produced per protocol event and is never mutated
//! afterwards. The rule engine only reads it.

use crate::file::{FileHandle, OpenFileMode};
use crate::node::NodeRef;
use crate::path::file_name;
use serde::Serialize;
use std::fmt;

/// Discriminant of an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Create,
    Delete,
    Rename,
    Move,
    Open,
    Close,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::Open => "open",
            Self::Close => "close",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateFileOperation {
    pub name: String,
    pub path: String,
    pub root: NodeRef,
    /// Space the client asked to reserve
    pub allocation_size: u64,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFileOperation {
    pub name: String,
    pub path: String,
    pub root: NodeRef,
}

/// Rename within one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameFileOperation {
    pub from: String,
    pub to: String,
    pub from_path: String,
    pub to_path: String,
    pub root: NodeRef,
}

/// Rename across folders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFileOperation {
    pub from: String,
    pub to: String,
    pub from_path: String,
    pub to_path: String,
    pub root: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenFileOperation {
    pub name: String,
    pub path: String,
    pub root: NodeRef,
    pub mode: OpenFileMode,
    pub truncate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseFileOperation {
    pub name: String,
    pub path: String,
    pub root: NodeRef,
    pub file: FileHandle,
    pub delete_on_close: bool,
}

/// A single filesystem event for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    Create(CreateFileOperation),
    Delete(DeleteFileOperation),
    Rename(RenameFileOperation),
    Move(MoveFileOperation),
    Open(OpenFileOperation),
    Close(CloseFileOperation),
}

impl Operation {
    pub fn create(root: NodeRef, path: impl Into<String>) -> Self {
        let path = path.into();
        Self::Create(CreateFileOperation {
            name: file_name(&path).to_string(),
            path,
            root,
            allocation_size: 0,
            hidden: false,
        })
    }

    pub fn delete(root: NodeRef, path: impl Into<String>) -> Self {
        let path = path.into();
        Self::Delete(DeleteFileOperation {
            name: file_name(&path).to_string(),
            path,
            root,
        })
    }

    pub fn rename(root: NodeRef, from_path: impl Into<String>, to_path: impl Into<String>) -> Self {
        let from_path = from_path.into();
        let to_path = to_path.into();
        Self::Rename(RenameFileOperation {
            from: file_name(&from_path).to_string(),
            to: file_name(&to_path).to_string(),
            from_path,
            to_path,
            root,
        })
    }

    pub fn move_file(
        root: NodeRef,
        from_path: impl Into<String>,
        to_path: impl Into<String>,
    ) -> Self {
        let from_path = from_path.into();
        let to_path = to_path.into();
        Self::Move(MoveFileOperation {
            from: file_name(&from_path).to_string(),
            to: file_name(&to_path).to_string(),
            from_path,
            to_path,
            root,
        })
    }

    pub fn open(root: NodeRef, path: impl Into<String>, mode: OpenFileMode) -> Self {
        let path = path.into();
        Self::Open(OpenFileOperation {
            name: file_name(&path).to_string(),
            path,
            root,
            mode,
            truncate: false,
        })
    }

    pub fn close(root: NodeRef, path: impl Into<String>, file: FileHandle) -> Self {
        let path = path.into();
        let delete_on_close = file.has_delete_on_close();
        Self::Close(CloseFileOperation {
            name: file_name(&path).to_string(),
            path,
            root,
            file,
            delete_on_close,
        })
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create(_) => OperationKind::Create,
            Self::Delete(_) => OperationKind::Delete,
            Self::Rename(_) => OperationKind::Rename,
            Self::Move(_) => OperationKind::Move,
            Self::Open(_) => OperationKind::Open,
            Self::Close(_) => OperationKind::Close,
        }
    }

    /// Name of the file the operation acts on; the source name for renames and moves
    pub fn name(&self) -> &str {
        match self {
            Self::Create(op) => &op.name,
            Self::Delete(op) => &op.name,
            Self::Rename(op) => &op.from,
            Self::Move(op) => &op.from,
            Self::Open(op) => &op.name,
            Self::Close(op) => &op.name,
        }
    }

    /// Path of the file the operation acts on; the source path for renames and moves
    pub fn path(&self) -> &str {
        match self {
            Self::Create(op) => &op.path,
            Self::Delete(op) => &op.path,
            Self::Rename(op) => &op.from_path,
            Self::Move(op) => &op.from_path,
            Self::Open(op) => &op.path,
            Self::Close(op) => &op.path,
        }
    }

    pub fn root(&self) -> &NodeRef {
        match self {
            Self::Create(op) => &op.root,
            Self::Delete(op) => &op.root,
            Self::Rename(op) => &op.root,
            Self::Move(op) => &op.root,
            Self::Open(op) => &op.root,
            Self::Close(op) => &op.root,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename(op) => write!(f, "rename {} -> {}", op.from_path, op.to_path),
            Self::Move(op) => write!(f, "move {} -> {}", op.from_path, op.to_path),
            Self::Open(op) => write!(f, "open {} ({:?})", op.path, op.mode),
            other => write!(f, "{} {}", other.kind(), other.path()),
        }
    }
}
