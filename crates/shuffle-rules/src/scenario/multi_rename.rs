//! Multi-rename shuffle (Word on Mac with backup copies enabled)
//!
//! ```text
//! create Word Work File D_1.tmp
//! rename Backup of X -> older backup name   (optional rotation)
//! rename X -> Backup of X
//! rename Word Work File D_1.tmp -> X
//! delete <backup>
//! ```
//!
//! Renames are followed node by node, so the instance always knows where the
//! original X currently lives. The final rename is replaced with a soft
//! rename of that node back to X plus a content copy from the temp file.

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use shuffle_model::{Command, Operation, RenameFileOperation, names_match};
use tracing::{debug, info};

#[derive(Debug)]
pub struct MultiRenameShuffle {
    settings: ScenarioSettings,
}

impl MultiRenameShuffle {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for MultiRenameShuffle {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::MultiRenameShuffle
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        _context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        let Operation::Create(create) = operation else {
            return None;
        };
        if !self.settings.pattern.matches(&create.name) {
            return None;
        }
        debug!(name = %create.name, "multi-rename shuffle triggered");
        Some(Box::new(MultiRenameInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
            state: State::None,
            temp: create.name.clone(),
            moved: Vec::new(),
            backup: None,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Renames,
    AwaitDelete,
}

/// A node that has been renamed away from its original name
#[derive(Debug, Clone)]
struct MovedNode {
    origin: String,
    current: String,
    current_path: String,
}

#[derive(Debug)]
struct MultiRenameInstance {
    core: InstanceCore,
    state: State,
    temp: String,
    moved: Vec<MovedNode>,
    backup: Option<String>,
}

impl MultiRenameInstance {
    fn track(&mut self, rename: &RenameFileOperation) {
        let mut known = false;
        for node in &mut self.moved {
            if names_match(&node.current, &rename.from) {
                node.current = rename.to.clone();
                node.current_path = rename.to_path.clone();
                known = true;
            }
        }
        if !known {
            self.moved.push(MovedNode {
                origin: rename.from.clone(),
                current: rename.to.clone(),
                current_path: rename.to_path.clone(),
            });
        }
    }

    fn on_temp_rename(&mut self, rename: &RenameFileOperation) -> Option<Command> {
        let Some(original) = self
            .moved
            .iter()
            .find(|node| names_match(&node.origin, &rename.to))
            .cloned()
        else {
            return self.core.abort("temp file renamed to a name that was never moved");
        };

        info!(
            target = %rename.to,
            backup = %original.current,
            "multi-rename shuffle detected"
        );
        let root = &rename.root;
        self.backup = Some(original.current.clone());
        self.state = State::AwaitDelete;
        Some(Command::compound(vec![
            Command::soft_rename(root, &original.current_path, &rename.to_path),
            Command::copy_content(root, &rename.from_path, &rename.to_path),
            Command::delete(root, &rename.from_path),
        ]))
    }
}

impl ScenarioInstance for MultiRenameInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        if self.core.timed_out() {
            return None;
        }

        match self.state {
            State::None => match operation {
                Operation::Create(create) if names_match(&create.name, &self.temp) => {
                    self.state = State::Renames;
                    None
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Renames => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.temp) => {
                    self.core.abort("temp file deleted")
                }
                Operation::Rename(rename) if names_match(&rename.from, &self.temp) => {
                    self.on_temp_rename(rename)
                }
                Operation::Rename(rename) => {
                    self.track(rename);
                    None
                }
                _ => None,
            },
            State::AwaitDelete => match operation {
                Operation::Delete(delete)
                    if self
                        .backup
                        .as_deref()
                        .is_some_and(|backup| names_match(&delete.name, backup)) =>
                {
                    self.core.finish();
                    Some(Command::DoNothing)
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
        Some(&self.temp)
    }
}
