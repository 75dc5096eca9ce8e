//! Double-rename shuffle (Word 2007, FrameMaker)
//!
//! ```text
//! rename X -> B        (B matches the backup pattern)
//! rename T -> X        (new content takes the name)
//! delete B
//! ```
//!
//! The second rename becomes `soft-rename B -> X`, `copy T -> X`, `delete T`,
//! and the trailing delete of B is swallowed.

use super::{InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind, ScenarioSettings};
use crate::context::ScenarioContext;
use shuffle_model::{Command, Operation, names_match};
use tracing::{debug, info};

#[derive(Debug)]
pub struct DoubleRenameShuffle {
    settings: ScenarioSettings,
}

impl DoubleRenameShuffle {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for DoubleRenameShuffle {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::DoubleRenameShuffle
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
        debug!(from = %rename.from, to = %rename.to, "double-rename shuffle triggered");
        Some(Box::new(DoubleRenameInstance {
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
    Renamed,
    AwaitDelete,
}

#[derive(Debug)]
struct DoubleRenameInstance {
    core: InstanceCore,
    state: State,
    original: String,
    original_path: String,
    backup: String,
    backup_path: String,
}

impl ScenarioInstance for DoubleRenameInstance {
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
                    self.state = State::Renamed;
                    None
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Renamed => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.backup) => {
                    self.core.abort("backup deleted before replacement arrived")
                }
                Operation::Rename(rename) if names_match(&rename.from, &self.backup) => {
                    self.core.abort("backup renamed away")
                }
                Operation::Create(create) if names_match(&create.name, &self.original) => {
                    self.core.abort("original recreated in place")
                }
                Operation::Rename(rename) if names_match(&rename.to, &self.original) => {
                    info!(
                        original = %self.original,
                        replacement = %rename.from,
                        "double-rename shuffle detected"
                    );
                    let root = &rename.root;
                    self.state = State::AwaitDelete;
                    Some(Command::compound(vec![
                        Command::soft_rename(root, &self.backup_path, &self.original_path),
                        Command::copy_content(root, &rename.from_path, &self.original_path),
                        Command::delete(root, &rename.from_path),
                    ]))
                }
                _ => None,
            },
            State::AwaitDelete => match operation {
                Operation::Delete(delete) if names_match(&delete.name, &self.backup) => {
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
        Some(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::test_support::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn scenario() -> DoubleRenameShuffle {
        DoubleRenameShuffle::new(settings(
            ScenarioKind::DoubleRenameShuffle,
            r"[0-9A-F]{6,8}\.tmp|.*\.backup\.fm",
        ))
    }

    #[test]
    fn test_word_2007_save() {
        let (mut instance, first) = spawn(&scenario(), &rename("TEST.DOCX", "788A1D3D.tmp"));
        assert_eq!(first, None);

        let command = instance.evaluate(&rename("19ECA1A.tmp", "TEST.DOCX"));
        assert_eq!(
            command,
            Some(Command::compound(vec![
                Command::soft_rename(&root(), "788A1D3D.tmp", "TEST.DOCX"),
                Command::copy_content(&root(), "19ECA1A.tmp", "TEST.DOCX"),
                Command::delete(&root(), "19ECA1A.tmp"),
            ]))
        );

        assert_eq!(instance.evaluate(&delete("788A1D3D.tmp")), Some(Command::DoNothing));
        assert!(instance.is_complete());
    }

    #[test]
    fn test_framemaker_backup_pattern() {
        let (mut instance, _) = spawn(&scenario(), &rename("X.fm", "X.backup.fm"));
        let command = instance.evaluate(&rename("X.fm.C29", "X.fm"));
        assert!(matches!(command, Some(Command::Compound(_))));
    }

    #[test]
    fn test_rename_between_backup_names_does_not_trigger() {
        let context_store = store();
        let context = ScenarioContext::detached(&context_store);
        let op = rename("AAAAAA.tmp", "BBBBBB.tmp");
        assert!(scenario().create_instance(&context, &op).is_none());
    }

    #[rstest]
    #[case::backup_deleted(delete("788A1D3D.tmp"))]
    #[case::backup_renamed(rename("788A1D3D.tmp", "elsewhere.docx"))]
    #[case::original_recreated(create("TEST.DOCX"))]
    fn test_anti_patterns_abort(#[case] op: Operation) {
        let (mut instance, _) = spawn(&scenario(), &rename("TEST.DOCX", "788A1D3D.tmp"));
        assert_eq!(instance.evaluate(&op), None);
        assert!(instance.is_complete());
    }
}
