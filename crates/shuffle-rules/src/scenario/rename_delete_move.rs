//! Rename-delete-move (safe-save editors such as TextEdit)
//!
//! ```text
//! rename X -> X.sb-1234-abcd
//! delete X.sb-1234-abcd
//! move T -> X
//! ```

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use shuffle_model::{CaptureSlot, Command, CommandResult, NodeRef, Operation, names_match};
use tracing::{debug, info};

#[derive(Debug)]
pub struct RenameDeleteMove {
    settings: ScenarioSettings,
}

impl RenameDeleteMove {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for RenameDeleteMove {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::RenameDeleteMove
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        _context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        let Operation::Rename(rename) = operation else {
            return None;
        };
        let pattern = &self.settings.pattern;
        if !pattern.matches(&rename.to) || pattern.matches(&rename.from) {
            return None;
        }
        debug!(from = %rename.from, to = %rename.to, "rename-delete-move triggered");
        Some(Box::new(RenameDeleteMoveInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
            state: State::None,
            original: rename.from.clone(),
            backup: rename.to.clone(),
            archived: None,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Renamed,
    Deleted,
}

#[derive(Debug)]
struct RenameDeleteMoveInstance {
    core: InstanceCore,
    state: State,
    original: String,
    backup: String,
    archived: Option<NodeRef>,
}

impl RenameDeleteMoveInstance {
    fn on_replace(&mut self, root: &NodeRef, from_path: &str, to_path: &str) -> Option<Command> {
        let Some(archived) = self.archived.clone() else {
            return self.core.abort("archived node was never captured");
        };
        info!(original = %self.original, "rename-delete-move detected");
        self.core.finish();
        Some(Command::compound(vec![
            Command::restore(root, to_path, &archived),
            Command::copy_content(root, from_path, to_path),
            Command::delete(root, from_path),
        ]))
    }
}

impl ScenarioInstance for RenameDeleteMoveInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        if self.core.timed_out() {
            return None;
        }

        if let Operation::Create(create) = operation {
            if self.state != State::None && names_match(&create.name, &self.original) {
                return self.core.abort("original recreated in place");
            }
        }

        match self.state {
            State::None => match operation {
                Operation::Rename(rename)
                    if names_match(&rename.from, &self.original)
                        && names_match(&rename.to, &self.backup) =>
                {
                    self.state = State::Renamed;
                    None
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Renamed => match operation {
                Operation::Rename(rename) if names_match(&rename.from, &self.backup) => {
                    self.core.abort("backup renamed away")
                }
                Operation::Rename(rename) if names_match(&rename.to, &self.original) => {
                    self.core.abort("replacement arrived before the backup was deleted")
                }
                Operation::Move(mv) if names_match(&mv.to, &self.original) => {
                    self.core.abort("replacement arrived before the backup was deleted")
                }
                Operation::Delete(delete) if names_match(&delete.name, &self.backup) => {
                    self.state = State::Deleted;
                    Some(
                        Command::delete(&delete.root, &delete.path)
                            .with_post_commit(Command::capture(CaptureSlot::ArchivedNode)),
                    )
                }
                _ => None,
            },
            State::Deleted => match operation {
                Operation::Move(mv) if names_match(&mv.to, &self.original) => {
                    self.on_replace(&mv.root, &mv.from_path, &mv.to_path)
                }
                Operation::Rename(rename) if names_match(&rename.to, &self.original) => {
                    self.on_replace(&rename.root, &rename.from_path, &rename.to_path)
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
        Some(&self.original)
    }

    fn accept_result(&mut self, slot: CaptureSlot, result: &CommandResult) {
        if slot == CaptureSlot::ArchivedNode {
            self.archived = result.node().cloned();
        }
    }
}
