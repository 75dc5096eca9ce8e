//! Create-shuffle: the classic Word 2003 save
//!
//! ```text
//! create ~WRD0001.TMP          (new content written here)
//! rename X -> Y                (original moved aside)
//! rename ~WRD0001.TMP -> X     (new content takes the name)
//! delete Y
//! ```
//!
//! The last rename is replaced so that X keeps its original node:
//! `rename Y -> X`, `copy ~WRD0001.TMP -> X`, `rename ~WRD0001.TMP -> Y`.
//! The trailing delete of Y then removes the temp file's node instead. The
//! instance answers that delete itself so no other live instance can turn it
//! into something else.

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use shuffle_model::{Command, Operation, RenameFileOperation, names_match};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug)]
pub struct CreateShuffle {
    settings: ScenarioSettings,
}

impl CreateShuffle {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for CreateShuffle {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::CreateShuffle
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
        debug!(name = %create.name, "create-shuffle triggered");
        Some(Box::new(CreateShuffleInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
            state: State::None,
            temp: create.name.clone(),
            renames: HashMap::new(),
            end: None,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Rename,
    Delete,
}

#[derive(Debug, Clone)]
struct RenameHop {
    to: String,
    to_path: String,
}

#[derive(Debug)]
struct CreateShuffleInstance {
    core: InstanceCore,
    state: State,
    temp: String,
    /// Observed renames keyed by lowercased source name
    renames: HashMap<String, RenameHop>,
    end: Option<String>,
}

impl CreateShuffleInstance {
    fn on_rename(&mut self, rename: &RenameFileOperation) -> Option<Command> {
        if !names_match(&rename.from, &self.temp) {
            self.renames.insert(
                rename.from.to_lowercase(),
                RenameHop {
                    to: rename.to.clone(),
                    to_path: rename.to_path.clone(),
                },
            );
            return None;
        }

        let Some(hop) = self.renames.get(&rename.to.to_lowercase()).cloned() else {
            return self.core.abort("temp file renamed without a rename chain");
        };

        info!(
            target = %rename.to,
            backup = %hop.to,
            "create-shuffle detected"
        );
        let root = &rename.root;
        let command = Command::compound(vec![
            Command::rename(root, &hop.to_path, &rename.to_path),
            Command::copy_content(root, &rename.from_path, &rename.to_path),
            Command::rename(root, &rename.from_path, &hop.to_path),
        ]);
        self.end = Some(hop.to);
        self.state = State::Delete;
        Some(command)
    }
}

impl ScenarioInstance for CreateShuffleInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        if self.core.timed_out() {
            return None;
        }

        if let Operation::Delete(delete) = operation {
            if self.state != State::Delete && names_match(&delete.name, &self.temp) {
                return self.core.abort("temp file deleted");
            }
        }

        match self.state {
            State::None => match operation {
                Operation::Create(create) if names_match(&create.name, &self.temp) => {
                    self.state = State::Rename;
                    None
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Rename => match operation {
                Operation::Rename(rename) => self.on_rename(rename),
                _ => None,
            },
            State::Delete => match operation {
                Operation::Delete(delete)
                    if self.end.as_deref().is_some_and(|end| names_match(&delete.name, end)) =>
                {
                    self.core.finish();
                    Some(Command::delete(&delete.root, &delete.path))
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
