//! Rename shuffle (vi, emacs and other editors that keep a `~` backup)
//!
//! ```text
//! rename X -> X~
//! create X          (new content written here)
//! delete X~
//! ```
//!
//! The delete of the backup becomes `copy X -> X~`, `delete X`,
//! `rename X~ -> X`, leaving the original node in place with new content.

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use shuffle_model::{Command, Operation, names_match};
use tracing::{debug, info};

#[derive(Debug)]
pub struct RenameShuffle {
    settings: ScenarioSettings,
}

impl RenameShuffle {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for RenameShuffle {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::RenameShuffle
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
        debug!(from = %rename.from, to = %rename.to, "rename shuffle triggered");
        Some(Box::new(RenameShuffleInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
            state: State::None,
            original: rename.from.clone(),
            original_path: rename.from_path.clone(),
            backup: rename.to.clone(),
            backup_path: rename.to_path.clone(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Initialised,
    LookForDelete,
}

#[derive(Debug)]
struct RenameShuffleInstance {
    core: InstanceCore,
    state: State,
    original: String,
    original_path: String,
    backup: String,
    backup_path: String,
}

impl ScenarioInstance for RenameShuffleInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        if self.core.timed_out() {
            return None;
        }

        match self.state {
            State::None => match operation {
                Operation::Rename(rename)
                    if names_match(&rename.from, &self.original)
                        && names_match(&rename.to, &self.backup) =>
                {
                    self.state = State::Initialised;
                    None
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Initialised => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.backup) => {
                    self.core.abort("backup deleted before the file was recreated")
                }
                Operation::Rename(rename) if names_match(&rename.from, &self.backup) => {
                    self.core.abort("backup renamed away")
                }
                Operation::Create(create) if names_match(&create.name, &self.original) => {
                    self.state = State::LookForDelete;
                    None
                }
                _ => None,
            },
            State::LookForDelete => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.original) => {
                    self.core.abort("recreated file deleted")
                }
                Operation::Delete(delete) if names_match(&delete.name, &self.backup) => {
                    info!(original = %self.original, backup = %self.backup, "rename shuffle detected");
                    let root = &delete.root;
                    self.core.finish();
                    Some(Command::compound(vec![
                        Command::copy_content(root, &self.original_path, &self.backup_path),
                        Command::delete(root, &self.original_path),
                        Command::rename(root, &self.backup_path, &self.original_path),
                    ]))
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
}
