//! Delete-restore and delete-rename-or-create
//!
//! Both follow a delete of X by archiving the node instead of dropping it.
//! When X comes back shortly afterwards the archived node is restored so the
//! file keeps its identity:
//!
//! - `delete X`, `create X` becomes a restore of the archived X.
//! - `delete X`, `rename Y -> X` (delete-rename-or-create only) becomes
//!   `restore X`, `copy Y -> X`, `delete Y`.

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use shuffle_model::{
    CaptureSlot, Command, CommandResult, CreateFileOperation, NodeRef, Operation, names_match,
};
use tracing::{debug, info};

#[derive(Debug)]
pub struct DeleteRestore {
    settings: ScenarioSettings,
}

impl DeleteRestore {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for DeleteRestore {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::DeleteRestore
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        spawn_tracker(self.kind(), &self.settings, context, operation, false)
    }
}

#[derive(Debug)]
pub struct DeleteRenameOrCreate {
    settings: ScenarioSettings,
}

impl DeleteRenameOrCreate {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for DeleteRenameOrCreate {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::DeleteRenameOrCreate
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        spawn_tracker(self.kind(), &self.settings, context, operation, true)
    }
}

fn spawn_tracker(
    kind: ScenarioKind,
    settings: &ScenarioSettings,
    context: &ScenarioContext<'_>,
    operation: &Operation,
    follow_renames: bool,
) -> Option<Box<dyn ScenarioInstance>> {
    let Operation::Delete(delete) = operation else {
        return None;
    };
    if !settings.pattern.matches(&delete.name) || context.is_tracking(kind, &delete.name) {
        return None;
    }
    debug!(scenario = %kind, name = %delete.name, "delete tracked for restore");
    Some(Box::new(ArchiveRestoreInstance {
        core: InstanceCore::new(kind, settings),
        state: State::None,
        name: delete.name.clone(),
        archived: None,
        follow_renames,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Deleted,
}

#[derive(Debug)]
struct ArchiveRestoreInstance {
    core: InstanceCore,
    state: State,
    name: String,
    archived: Option<NodeRef>,
    follow_renames: bool,
}

impl ArchiveRestoreInstance {
    fn archive(&mut self, root: &NodeRef, path: &str) -> Option<Command> {
        self.state = State::Deleted;
        self.archived = None;
        Some(
            Command::delete(root, path).with_post_commit(Command::capture(CaptureSlot::ArchivedNode)),
        )
    }

    fn on_create(&mut self, create: &CreateFileOperation) -> Option<Command> {
        let Some(archived) = self.archived.clone() else {
            return self.core.abort("archived node was never captured");
        };
        info!(scenario = %self.core.kind(), name = %create.name, "restoring deleted file");
        self.core.finish();
        Some(Command::RestoreFromArchive {
            name: create.name.clone(),
            root: create.root.clone(),
            path: create.path.clone(),
            allocation_size: create.allocation_size,
            archived,
        })
    }

    fn on_rename_onto(&mut self, root: &NodeRef, from_path: &str, to_path: &str) -> Option<Command> {
        if !self.follow_renames {
            return self.core.abort("replaced by a rename");
        }
        let Some(archived) = self.archived.clone() else {
            return self.core.abort("archived node was never captured");
        };
        info!(scenario = %self.core.kind(), name = %self.name, "restoring file replaced by rename");
        self.core.finish();
        Some(Command::compound(vec![
            Command::restore(root, to_path, &archived),
            Command::copy_content(root, from_path, to_path),
            Command::delete(root, from_path),
        ]))
    }
}

impl ScenarioInstance for ArchiveRestoreInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        if self.core.timed_out() {
            return None;
        }

        match self.state {
            State::None => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.name) => {
                    self.archive(&delete.root, &delete.path)
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Deleted => match operation {
                Operation::Create(create) if names_match(&create.name, &self.name) => {
                    self.on_create(create)
                }
                Operation::Rename(rename) if names_match(&rename.to, &self.name) => {
                    self.on_rename_onto(&rename.root, &rename.from_path, &rename.to_path)
                }
                Operation::Move(mv) if names_match(&mv.to, &self.name) => {
                    self.on_rename_onto(&mv.root, &mv.from_path, &mv.to_path)
                }
                // The name came back some other way and is going again
                Operation::Delete(delete) if names_match(&delete.name, &self.name) => {
                    self.archive(&delete.root, &delete.path)
                }
                _ => None,
            },
        }
    }

    fn is_complete(&self) -> bool {
        self.core.is_complete()
    }

    fn ranking(&self) -> Ranking {
        self.core.ranking()
    }

    fn subject(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn accept_result(&mut self, slot: CaptureSlot, result: &CommandResult) {
        if slot != CaptureSlot::ArchivedNode {
            return;
        }
        if let Some(node) = result.node() {
            debug!(scenario = %self.core.kind(), node = %node, "archived node captured");
            self.archived = Some(node.clone());
        }
    }
}
