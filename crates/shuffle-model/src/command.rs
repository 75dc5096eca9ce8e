//! Repository commands produced by the rule engine
//!
//! A command is a complete, replayable instruction: it carries absolute
//! names and paths rather than deltas, so an executor can apply it without
//! consulting the operation that caused it.

use crate::file::{FileHandle, OpenFileMode};
use crate::node::NodeRef;
use crate::path::file_name;
use serde::Serialize;

/// Transaction an executor must open around a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    None,
    ReadOnly,
    ReadWrite,
}

/// Engine-private address of a live scenario instance.
///
/// Tickets only route captured results back to the instance that asked for
/// them; nothing else can address an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InstanceTicket(u64);

impl InstanceTicket {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Which value an instance is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureSlot {
    /// Archive reference of a node removed by a delete
    ArchivedNode,
    /// Handle from an open or create granting read-only access
    ReadOnlyHandle,
    /// Handle from an open or create granting write access
    ReadWriteHandle,
    /// Confirmation that a soft rename parking a deleted file was applied
    ParkedNode,
}

/// Request to hand the outcome of a compound's primary commands back to the
/// instance that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCapture {
    pub ticket: Option<InstanceTicket>,
    pub slot: CaptureSlot,
}

impl ResultCapture {
    /// A capture not yet addressed to an instance
    pub fn pending(slot: CaptureSlot) -> Self {
        Self { ticket: None, slot }
    }
}

/// What an executed command produced
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum CommandResult {
    #[default]
    None,
    Node(NodeRef),
    File(FileHandle),
}

impl CommandResult {
    pub fn node(&self) -> Option<&NodeRef> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&FileHandle> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }
}

/// Ordered bundle of commands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CompoundCommand {
    /// Executed now, in order, inside one transaction
    pub commands: Vec<Command>,
    /// Executed only after the transaction commits
    pub post_commit: Vec<Command>,
    /// Compensating actions executed after the transaction fails
    pub post_error: Vec<Command>,
}

impl CompoundCommand {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }

    pub fn with_post_commit(mut self, command: Command) -> Self {
        self.post_commit.push(command);
        self
    }

    pub fn with_post_error(mut self, command: Command) -> Self {
        self.post_error.push(command);
        self
    }
}

/// An instruction for the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    CreateFile {
        name: String,
        root: NodeRef,
        path: String,
        allocation_size: u64,
        hidden: bool,
    },
    DeleteFile {
        name: String,
        root: NodeRef,
        path: String,
    },
    RenameFile {
        from: String,
        to: String,
        root: NodeRef,
        from_path: String,
        to_path: String,
    },
    MoveFile {
        root: NodeRef,
        from_path: String,
        to_path: String,
    },
    OpenFile {
        name: String,
        mode: OpenFileMode,
        truncate: bool,
        root: NodeRef,
        path: String,
    },
    CloseFile {
        name: String,
        file: FileHandle,
        root: NodeRef,
        path: String,
    },
    CopyContent {
        root: NodeRef,
        from_path: String,
        to_path: String,
    },
    RestoreFromArchive {
        name: String,
        root: NodeRef,
        path: String,
        allocation_size: u64,
        archived: NodeRef,
    },
    /// Rename that leaves rename behaviour on the repository side untouched
    SoftRename {
        from: String,
        to: String,
        root: NodeRef,
        from_path: String,
        to_path: String,
    },
    ReduceQuota {
        file: FileHandle,
    },
    RemoveTempFile {
        file: FileHandle,
    },
    RemoveNoContentFile {
        root: NodeRef,
        path: String,
    },
    Compound(CompoundCommand),
    Capture(ResultCapture),
    DoNothing,
    ReturnValue(CommandResult),
}

impl Command {
    pub fn rename(root: &NodeRef, from_path: &str, to_path: &str) -> Self {
        Self::RenameFile {
            from: file_name(from_path).to_string(),
            to: file_name(to_path).to_string(),
            root: root.clone(),
            from_path: from_path.to_string(),
            to_path: to_path.to_string(),
        }
    }

    pub fn soft_rename(root: &NodeRef, from_path: &str, to_path: &str) -> Self {
        Self::SoftRename {
            from: file_name(from_path).to_string(),
            to: file_name(to_path).to_string(),
            root: root.clone(),
            from_path: from_path.to_string(),
            to_path: to_path.to_string(),
        }
    }

    pub fn copy_content(root: &NodeRef, from_path: &str, to_path: &str) -> Self {
        Self::CopyContent {
            root: root.clone(),
            from_path: from_path.to_string(),
            to_path: to_path.to_string(),
        }
    }

    pub fn delete(root: &NodeRef, path: &str) -> Self {
        Self::DeleteFile {
            name: file_name(path).to_string(),
            root: root.clone(),
            path: path.to_string(),
        }
    }

    pub fn restore(root: &NodeRef, path: &str, archived: &NodeRef) -> Self {
        Self::RestoreFromArchive {
            name: file_name(path).to_string(),
            root: root.clone(),
            path: path.to_string(),
            allocation_size: 0,
            archived: archived.clone(),
        }
    }

    pub fn open(root: &NodeRef, path: &str, mode: OpenFileMode, truncate: bool) -> Self {
        Self::OpenFile {
            name: file_name(path).to_string(),
            mode,
            truncate,
            root: root.clone(),
            path: path.to_string(),
        }
    }

    pub fn compound(commands: Vec<Command>) -> Self {
        Self::Compound(CompoundCommand::new(commands))
    }

    pub fn capture(slot: CaptureSlot) -> Self {
        Self::Capture(ResultCapture::pending(slot))
    }

    /// The transaction an executor needs for this command
    pub fn transaction(&self) -> TransactionKind {
        match self {
            Self::CreateFile { .. }
            | Self::DeleteFile { .. }
            | Self::RenameFile { .. }
            | Self::MoveFile { .. }
            | Self::CloseFile { .. }
            | Self::CopyContent { .. }
            | Self::RestoreFromArchive { .. }
            | Self::SoftRename { .. }
            | Self::ReduceQuota { .. }
            | Self::RemoveNoContentFile { .. } => TransactionKind::ReadWrite,
            Self::OpenFile { mode, truncate, .. } => {
                if mode.is_write() || *truncate {
                    TransactionKind::ReadWrite
                } else {
                    TransactionKind::ReadOnly
                }
            }
            Self::Compound(compound) => compound
                .commands
                .iter()
                .map(Command::transaction)
                .max()
                .unwrap_or(TransactionKind::None),
            Self::RemoveTempFile { .. }
            | Self::Capture(_)
            | Self::DoNothing
            | Self::ReturnValue(_) => TransactionKind::None,
        }
    }

    /// Append `command` to the post-commit list, wrapping `self` in a
    /// compound when it is not one already.
    pub fn with_post_commit(self, command: Command) -> Self {
        match self {
            Self::Compound(compound) => Self::Compound(compound.with_post_commit(command)),
            other => Self::Compound(CompoundCommand::new(vec![other]).with_post_commit(command)),
        }
    }

    /// Address every not-yet-addressed capture in this command tree to `ticket`.
    pub fn stamp_captures(&mut self, ticket: InstanceTicket) {
        match self {
            Self::Capture(capture) => {
                if capture.ticket.is_none() {
                    capture.ticket = Some(ticket);
                }
            }
            Self::Compound(compound) => {
                for command in compound
                    .commands
                    .iter_mut()
                    .chain(compound.post_commit.iter_mut())
                    .chain(compound.post_error.iter_mut())
                {
                    command.stamp_captures(ticket);
                }
            }
            _ => {}
        }
    }

    /// All rename-like commands (rename, soft rename, move) in execution order
    pub fn renames(&self) -> Vec<(&str, &str)> {
        match self {
            Self::RenameFile {
                from_path, to_path, ..
            }
            | Self::SoftRename {
                from_path, to_path, ..
            }
            | Self::MoveFile {
                from_path, to_path, ..
            } => vec![(from_path.as_str(), to_path.as_str())],
            Self::Compound(compound) => compound.commands.iter().flat_map(Command::renames).collect(),
            _ => Vec::new(),
        }
    }

    /// Short label used in logs and listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateFile { .. } => "create-file",
            Self::DeleteFile { .. } => "delete-file",
            Self::RenameFile { .. } => "rename-file",
            Self::MoveFile { .. } => "move-file",
            Self::OpenFile { .. } => "open-file",
            Self::CloseFile { .. } => "close-file",
            Self::CopyContent { .. } => "copy-content",
            Self::RestoreFromArchive { .. } => "restore-from-archive",
            Self::SoftRename { .. } => "soft-rename",
            Self::ReduceQuota { .. } => "reduce-quota",
            Self::RemoveTempFile { .. } => "remove-temp-file",
            Self::RemoveNoContentFile { .. } => "remove-no-content-file",
            Self::Compound(_) => "compound",
            Self::Capture(_) => "capture",
            Self::DoNothing => "do-nothing",
            Self::ReturnValue(_) => "return-value",
        }
    }
}
