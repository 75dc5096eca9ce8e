//! Literal translation of operations into commands
//!
//! The default scenario answers every operation at the lowest ranking, so the
//! evaluator always has a command to return.

use super::{
    InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings,
    close_command,
};
use crate::context::ScenarioContext;
use crate::pattern::FilePattern;
use shuffle_model::{Command, Operation};

#[derive(Debug)]
pub struct DefaultScenario {
    settings: ScenarioSettings,
}

impl DefaultScenario {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Default for DefaultScenario {
    fn default() -> Self {
        Self::new(ScenarioSettings::for_kind(ScenarioKind::Default, FilePattern::any()))
    }
}

impl Scenario for DefaultScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Default
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        _context: &ScenarioContext<'_>,
        _operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        Some(Box::new(DefaultInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
        }))
    }
}

#[derive(Debug)]
struct DefaultInstance {
    core: InstanceCore,
}

impl ScenarioInstance for DefaultInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        self.core.finish();
        Some(translate(operation))
    }

    fn is_complete(&self) -> bool {
        self.core.is_complete()
    }

    fn ranking(&self) -> Ranking {
        self.core.ranking()
    }
}

/// One-to-one command for an operation
pub(crate) fn translate(operation: &Operation) -> Command {
    match operation {
        Operation::Create(op) => Command::CreateFile {
            name: op.name.clone(),
            root: op.root.clone(),
            path: op.path.clone(),
            allocation_size: op.allocation_size,
            hidden: op.hidden,
        },
        Operation::Delete(op) => Command::DeleteFile {
            name: op.name.clone(),
            root: op.root.clone(),
            path: op.path.clone(),
        },
        Operation::Rename(op) => Command::RenameFile {
            from: op.from.clone(),
            to: op.to.clone(),
            root: op.root.clone(),
            from_path: op.from_path.clone(),
            to_path: op.to_path.clone(),
        },
        Operation::Move(op) => Command::MoveFile {
            root: op.root.clone(),
            from_path: op.from_path.clone(),
            to_path: op.to_path.clone(),
        },
        Operation::Open(op) => Command::open(&op.root, &op.path, op.mode, op.truncate),
        Operation::Close(op) => close_command(op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::test_support::*;
    use pretty_assertions::assert_eq;
    use shuffle_model::{CompoundCommand, OpenFileMode};

    #[test]
    fn test_one_instance_per_operation() {
        let (instance, command) = spawn(&DefaultScenario::default(), &delete("a.txt"));
        assert_eq!(command, Some(Command::delete(&root(), "a.txt")));
        assert!(instance.is_complete());
        assert_eq!(instance.ranking(), Ranking::Low);
    }

    #[test]
    fn test_rename_translates_literally() {
        assert_eq!(
            translate(&rename(r"\d\a.txt", r"\d\b.txt")),
            Command::rename(&root(), r"\d\a.txt", r"\d\b.txt")
        );
    }

    #[test]
    fn test_open_keeps_mode() {
        let op = Operation::open(root(), "a.txt", OpenFileMode::ReadOnly);
        assert_eq!(
            translate(&op),
            Command::open(&root(), "a.txt", OpenFileMode::ReadOnly, false)
        );
    }

    #[test]
    fn test_close_carries_cleanup() {
        let file = handle("a.txt", false);
        let op = Operation::close(root(), "a.txt", file.clone());
        assert_eq!(
            translate(&op),
            Command::Compound(
                CompoundCommand::new(vec![Command::CloseFile {
                    name: "a.txt".to_string(),
                    file: file.clone(),
                    root: root(),
                    path: "a.txt".to_string(),
                }])
                .with_post_commit(Command::ReduceQuota { file: file.clone() })
                .with_post_commit(Command::RemoveTempFile { file: file.clone() })
                .with_post_error(Command::RemoveNoContentFile {
                    root: root(),
                    path: "a.txt".to_string(),
                })
            )
        );
    }
}
