//! Scenario contracts and the built-in scenario families
//!
//! A [`Scenario`] is a stateless recognizer configured once at load time. When
//! an operation matches its trigger it spawns a [`ScenarioInstance`], a small
//! state machine that follows the rest of the save shuffle and substitutes
//! repository commands for the literal operations.

mod create_shuffle;
mod default;
mod delete_restore;
mod double_rename;
mod instance;
mod locked_delete;
mod multi_rename;
mod open_file;
mod rename_delete_move;
mod rename_shuffle;
mod temp_delete;

pub use create_shuffle::CreateShuffle;
pub use default::DefaultScenario;
pub use delete_restore::{DeleteRenameOrCreate, DeleteRestore};
pub use double_rename::DoubleRenameShuffle;
pub use locked_delete::{LockedDeleteShuffle, SHUFFLE_PREFIX};
pub use multi_rename::MultiRenameShuffle;
pub use open_file::OpenFileScenario;
pub use rename_delete_move::RenameDeleteMove;
pub use rename_shuffle::RenameShuffle;
pub use temp_delete::TempDeleteShuffle;

pub(crate) use instance::InstanceCore;

use crate::context::ScenarioContext;
use crate::pattern::FilePattern;
use serde::{Deserialize, Serialize};
use shuffle_model::{CaptureSlot, CloseFileOperation, Command, CommandResult, CompoundCommand, Operation};
use std::fmt;
use std::time::Duration;

/// Priority used to arbitrate between instances answering the same operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranking {
    Low,
    Medium,
    High,
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.pad(s)
    }
}

/// The built-in scenario families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    CreateShuffle,
    DoubleRenameShuffle,
    MultiRenameShuffle,
    RenameShuffle,
    DeleteRestore,
    DeleteRenameOrCreate,
    LockedDeleteShuffle,
    TempDeleteShuffle,
    RenameDeleteMove,
    OpenFile,
    Default,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 11] = [
        Self::CreateShuffle,
        Self::DoubleRenameShuffle,
        Self::MultiRenameShuffle,
        Self::RenameShuffle,
        Self::DeleteRestore,
        Self::DeleteRenameOrCreate,
        Self::LockedDeleteShuffle,
        Self::TempDeleteShuffle,
        Self::RenameDeleteMove,
        Self::OpenFile,
        Self::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateShuffle => "create-shuffle",
            Self::DoubleRenameShuffle => "double-rename-shuffle",
            Self::MultiRenameShuffle => "multi-rename-shuffle",
            Self::RenameShuffle => "rename-shuffle",
            Self::DeleteRestore => "delete-restore",
            Self::DeleteRenameOrCreate => "delete-rename-or-create",
            Self::LockedDeleteShuffle => "locked-delete-shuffle",
            Self::TempDeleteShuffle => "temp-delete-shuffle",
            Self::RenameDeleteMove => "rename-delete-move",
            Self::OpenFile => "open-file",
            Self::Default => "default",
        }
    }

    /// Ranking used when the configuration does not name one
    pub fn default_ranking(self) -> Ranking {
        match self {
            Self::OpenFile => Ranking::Medium,
            Self::Default => Ranking::Low,
            _ => Ranking::High,
        }
    }

    /// Timeout used when the configuration does not name one.
    ///
    /// Open-file and default instances never time out; their value is unused.
    pub fn default_timeout(self) -> Duration {
        match self {
            Self::LockedDeleteShuffle => Duration::from_secs(30 * 60),
            Self::DeleteRestore | Self::DeleteRenameOrCreate => Duration::from_secs(5),
            _ => Duration::from_secs(30),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Load-time attributes shared by every scenario
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub pattern: FilePattern,
    pub ranking: Ranking,
    pub timeout: Duration,
}

impl ScenarioSettings {
    pub fn new(pattern: FilePattern, ranking: Ranking, timeout: Duration) -> Self {
        Self {
            pattern,
            ranking,
            timeout,
        }
    }

    /// Settings with the kind's default ranking and timeout
    pub fn for_kind(kind: ScenarioKind, pattern: FilePattern) -> Self {
        Self::new(pattern, kind.default_ranking(), kind.default_timeout())
    }
}

/// Stateless recognizer for one shuffle pattern.
///
/// A scenario is shared by every context and may be asked about every
/// operation; it keeps no per-operation state.
pub trait Scenario: Send + Sync + fmt::Debug {
    fn kind(&self) -> ScenarioKind;

    fn settings(&self) -> &ScenarioSettings;

    /// Spawn an instance when `operation` triggers this scenario.
    fn create_instance(
        &self,
        context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>>;
}

/// One in-progress attempt to match a scenario against the operation stream
pub trait ScenarioInstance: Send + fmt::Debug {
    fn kind(&self) -> ScenarioKind;

    /// Observe the next operation, optionally answering it with a command.
    fn evaluate(&mut self, operation: &Operation) -> Option<Command>;

    fn is_complete(&self) -> bool;

    fn ranking(&self) -> Ranking;

    /// Name of the file the instance is following, for diagnostics and lookups
    fn subject(&self) -> Option<&str> {
        None
    }

    /// Receive the value requested by a capture this instance emitted
    fn accept_result(&mut self, _slot: CaptureSlot, _result: &CommandResult) {}

    fn rename_observer(&mut self) -> Option<&mut dyn RenameObserver> {
        None
    }

    fn dependent(&mut self) -> Option<&mut dyn DependentInstance> {
        None
    }
}

/// Instances that follow renames issued by commands other than their own
pub trait RenameObserver {
    fn notify_rename(&mut self, operation: &Operation, command: &Command);
}

/// Instances that still need something from an operation another instance won
pub trait DependentInstance {
    /// Amend the winning command; return it unchanged when nothing is needed.
    fn amend(&mut self, winner: Command) -> Command;
}

/// The literal close of a file, with quota and temp-file cleanup after commit
/// and removal of an empty node if the close fails.
pub(crate) fn close_command(close: &CloseFileOperation) -> Command {
    Command::Compound(
        CompoundCommand::new(vec![Command::CloseFile {
            name: close.name.clone(),
            file: close.file.clone(),
            root: close.root.clone(),
            path: close.path.clone(),
        }])
        .with_post_commit(Command::ReduceQuota {
            file: close.file.clone(),
        })
        .with_post_commit(Command::RemoveTempFile {
            file: close.file.clone(),
        })
        .with_post_error(Command::RemoveNoContentFile {
            root: close.root.clone(),
            path: close.path.clone(),
        }),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::session::SessionStore;
    use shuffle_model::{FileHandle, NetworkFile, NodeRef, path::file_name};
    use std::sync::Arc;

    pub fn root() -> NodeRef {
        NodeRef::new("root")
    }

    pub fn settings(kind: ScenarioKind, pattern: &str) -> ScenarioSettings {
        ScenarioSettings::for_kind(kind, FilePattern::new(pattern).unwrap())
    }

    pub fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(8))
    }

    /// Spawn from `scenario` and feed it the triggering operation
    pub fn spawn(
        scenario: &dyn Scenario,
        operation: &Operation,
    ) -> (Box<dyn ScenarioInstance>, Option<Command>) {
        spawn_with(scenario, operation, &store())
    }

    pub fn spawn_with(
        scenario: &dyn Scenario,
        operation: &Operation,
        store: &Arc<SessionStore>,
    ) -> (Box<dyn ScenarioInstance>, Option<Command>) {
        let context = ScenarioContext::detached(store);
        let mut instance = scenario
            .create_instance(&context, operation)
            .expect("operation should trigger the scenario");
        let command = instance.evaluate(operation);
        (instance, command)
    }

    pub fn create(path: &str) -> Operation {
        Operation::create(root(), path)
    }

    pub fn delete(path: &str) -> Operation {
        Operation::delete(root(), path)
    }

    pub fn rename(from: &str, to: &str) -> Operation {
        Operation::rename(root(), from, to)
    }

    pub fn move_file(from: &str, to: &str) -> Operation {
        Operation::move_file(root(), from, to)
    }

    #[derive(Debug)]
    pub struct StubFile {
        pub path: String,
        pub read_only: bool,
    }

    impl NetworkFile for StubFile {
        fn name(&self) -> &str {
            file_name(&self.path)
        }
        fn full_path(&self) -> &str {
            &self.path
        }
        fn is_read_only(&self) -> bool {
            self.read_only
        }
        fn has_delete_on_close(&self) -> bool {
            false
        }
    }

    pub fn handle(path: &str, read_only: bool) -> FileHandle {
        FileHandle::new(StubFile {
            path: path.to_string(),
            read_only,
        })
    }
}
