//! Temp-delete shuffle (saves staged in a temporary-items folder)
//!
//! ```text
//! create .TemporaryItems/X        (recorded in the session store)
//! delete X
//! move .TemporaryItems/X -> X
//! ```
//!
//! The temp file and the target usually live in different folders, so the
//! link between them goes through the session store rather than one
//! context's live instances. The delete archives X; the move restores it and
//! copies the new content in.

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use crate::session::SessionStore;
use shuffle_model::{CaptureSlot, Command, CommandResult, NodeRef, Operation, names_match, paths_match};
use std::sync::Arc;
use tracing::{debug, info};

const KEY_PREFIX: &str = "temp-created:";

fn store_key(name: &str) -> String {
    format!("{KEY_PREFIX}{}", name.to_lowercase())
}

#[derive(Debug)]
pub struct TempDeleteShuffle {
    settings: ScenarioSettings,
}

impl TempDeleteShuffle {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for TempDeleteShuffle {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::TempDeleteShuffle
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        let pattern = &self.settings.pattern;
        match operation {
            Operation::Create(create) if pattern.matches(&create.path) => {
                debug!(path = %create.path, "temp file recorded");
                context
                    .session()
                    .record(store_key(&create.name), create.path.clone());
                None
            }
            Operation::Delete(delete) if pattern.matches(&delete.path) => {
                context.session().forget(&store_key(&delete.name));
                None
            }
            Operation::Delete(delete) => {
                let temp_path = context.session().lookup(&store_key(&delete.name))?;
                debug!(name = %delete.name, temp = %temp_path, "temp-delete shuffle triggered");
                Some(Box::new(TempDeleteInstance {
                    core: InstanceCore::new(self.kind(), &self.settings),
                    state: State::None,
                    target: delete.name.clone(),
                    temp_path,
                    archived: None,
                    session: Arc::clone(context.session()),
                }))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Deleted,
}

#[derive(Debug)]
struct TempDeleteInstance {
    core: InstanceCore,
    state: State,
    target: String,
    temp_path: String,
    archived: Option<NodeRef>,
    session: Arc<SessionStore>,
}

impl TempDeleteInstance {
    fn on_move_in(&mut self, root: &NodeRef, from_path: &str, to_path: &str) -> Option<Command> {
        if !paths_match(from_path, &self.temp_path) {
            return self.core.abort("target replaced from another location");
        }
        let Some(archived) = self.archived.clone() else {
            return self.core.abort("archived node was never captured");
        };
        info!(target = %self.target, temp = %self.temp_path, "temp-delete shuffle detected");
        self.session.forget(&store_key(&self.target));
        self.core.finish();
        Some(Command::compound(vec![
            Command::restore(root, to_path, &archived),
            Command::copy_content(root, from_path, to_path),
            Command::delete(root, from_path),
        ]))
    }
}

impl ScenarioInstance for TempDeleteInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        if self.core.timed_out() {
            return None;
        }

        if let Operation::Create(create) = operation {
            if names_match(&create.name, &self.target) && !paths_match(&create.path, &self.temp_path) {
                return self.core.abort("target recreated in place");
            }
        }

        match self.state {
            State::None => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.target) => {
                    self.state = State::Deleted;
                    Some(
                        Command::delete(&delete.root, &delete.path)
                            .with_post_commit(Command::capture(CaptureSlot::ArchivedNode)),
                    )
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Deleted => match operation {
                Operation::Move(mv) if names_match(&mv.to, &self.target) => {
                    self.on_move_in(&mv.root, &mv.from_path, &mv.to_path)
                }
                Operation::Rename(rename) if names_match(&rename.to, &self.target) => {
                    self.on_move_in(&rename.root, &rename.from_path, &rename.to_path)
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
        Some(&self.target)
    }

    fn accept_result(&mut self, slot: CaptureSlot, result: &CommandResult) {
        if slot == CaptureSlot::ArchivedNode {
            self.archived = result.node().cloned();
        }
    }
}
