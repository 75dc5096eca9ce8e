//! Locked-delete shuffle (Office lock files)
//!
//! While an editor holds a lock file such as `~$report.docx`, deletes of
//! other files in the same folder are turned into soft renames to a hidden
//! shuffle name. When the file comes back, by move, rename or create, the
//! shuffled node is renamed back so the file keeps its identity.
//!
//! A park only counts once its soft rename has been applied: the rename
//! carries a capture, and a delete answered by another shuffle never delivers
//! it. Files still parked when the lock file goes away, or when the instance
//! times out, are deleted for real after the next winning command.

use super::{
    DependentInstance, InstanceCore, Ranking, Scenario, ScenarioInstance, ScenarioKind,
    ScenarioSettings,
};
use crate::context::ScenarioContext;
use shuffle_model::{
    CaptureSlot, Command, CommandResult, NodeRef, OpenFileMode, Operation, join_path, names_match,
    parent_path, paths_match,
};
use tracing::{debug, info};

/// Name prefix given to files parked while a lock file is held
pub const SHUFFLE_PREFIX: &str = "~shf-";

#[derive(Debug)]
pub struct LockedDeleteShuffle {
    settings: ScenarioSettings,
}

impl LockedDeleteShuffle {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for LockedDeleteShuffle {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::LockedDeleteShuffle
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
        debug!(lock = %create.name, "locked-delete shuffle triggered");
        Some(Box::new(LockedDeleteInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
            state: State::None,
            lock: create.name.clone(),
            folder: parent_path(&create.path).to_string(),
            parked: Vec::new(),
            unconfirmed: None,
            released: Vec::new(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Locked,
    DeleteSubstituted,
}

/// A deleted file parked under its shuffle name
#[derive(Debug, Clone)]
struct Parked {
    name: String,
    root: NodeRef,
    shuffle_path: String,
}

#[derive(Debug)]
struct LockedDeleteInstance {
    core: InstanceCore,
    state: State,
    lock: String,
    folder: String,
    parked: Vec<Parked>,
    /// Park issued for the current operation, kept once its capture arrives
    unconfirmed: Option<Parked>,
    /// Parked files to delete after the next winning command
    released: Vec<Parked>,
}

impl LockedDeleteInstance {
    fn take_parked(&mut self, name: &str) -> Option<Parked> {
        let index = self.parked.iter().position(|p| names_match(&p.name, name))?;
        let parked = self.parked.remove(index);
        if self.parked.is_empty() {
            self.state = State::Locked;
        }
        Some(parked)
    }

    /// Give up on every parked file; they are deleted by the next amendment.
    fn release(&mut self, reason: &str) {
        if !self.parked.is_empty() {
            debug!(count = self.parked.len(), reason, "releasing parked files");
            self.released.append(&mut self.parked);
        }
    }

    fn on_delete(&mut self, root: &NodeRef, name: &str, path: &str) -> Option<Command> {
        if name.starts_with(SHUFFLE_PREFIX)
            || !paths_match(parent_path(path), &self.folder)
            || self.parked.iter().any(|p| names_match(&p.name, name))
        {
            return None;
        }
        let shuffle_path = join_path(parent_path(path), &format!("{SHUFFLE_PREFIX}{name}"));
        debug!(name, shuffle = %shuffle_path, "parking deleted file");
        let command = Command::soft_rename(root, path, &shuffle_path)
            .with_post_commit(Command::capture(CaptureSlot::ParkedNode));
        self.unconfirmed = Some(Parked {
            name: name.to_string(),
            root: root.clone(),
            shuffle_path,
        });
        Some(command)
    }

    fn on_replace(
        &mut self,
        root: &NodeRef,
        target: &str,
        from_path: &str,
        to_path: &str,
    ) -> Option<Command> {
        let parked = self.take_parked(target)?;
        info!(name = %parked.name, lock = %self.lock, "locked-delete shuffle detected");
        Some(Command::compound(vec![
            Command::soft_rename(root, &parked.shuffle_path, to_path),
            Command::copy_content(root, from_path, to_path),
            Command::delete(root, from_path),
        ]))
    }
}

impl ScenarioInstance for LockedDeleteInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        self.unconfirmed = None;
        if self.core.timed_out() {
            self.release("lock timed out");
            return None;
        }

        if let Operation::Delete(delete) = operation {
            if self.state != State::None && names_match(&delete.name, &self.lock) {
                self.release("lock file deleted");
                return self.core.abort("lock file deleted");
            }
        }

        match self.state {
            State::None => match operation {
                Operation::Create(create) if names_match(&create.name, &self.lock) => {
                    self.state = State::Locked;
                    None
                }
                _ => self.core.abort("unexpected first operation"),
            },
            State::Locked | State::DeleteSubstituted => match operation {
                Operation::Delete(delete) => {
                    self.on_delete(&delete.root, &delete.name, &delete.path)
                }
                Operation::Move(mv) => {
                    self.on_replace(&mv.root, &mv.to, &mv.from_path, &mv.to_path)
                }
                Operation::Rename(rename) => {
                    self.on_replace(&rename.root, &rename.to, &rename.from_path, &rename.to_path)
                }
                Operation::Create(create) => {
                    let parked = self.take_parked(&create.name)?;
                    info!(name = %parked.name, lock = %self.lock, "parked file recreated");
                    let root = &create.root;
                    Some(Command::compound(vec![
                        Command::soft_rename(root, &parked.shuffle_path, &create.path),
                        Command::open(root, &create.path, OpenFileMode::ReadWrite, true),
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
        Some(&self.lock)
    }

    fn accept_result(&mut self, slot: CaptureSlot, _result: &CommandResult) {
        if slot != CaptureSlot::ParkedNode {
            return;
        }
        if let Some(parked) = self.unconfirmed.take() {
            self.parked.push(parked);
            self.state = State::DeleteSubstituted;
        }
    }

    fn dependent(&mut self) -> Option<&mut dyn DependentInstance> {
        Some(self)
    }
}

impl DependentInstance for LockedDeleteInstance {
    fn amend(&mut self, winner: Command) -> Command {
        self.released.drain(..).fold(winner, |command, parked| {
            command.with_post_commit(Command::delete(&parked.root, &parked.shuffle_path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::test_support::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn scenario() -> LockedDeleteShuffle {
        LockedDeleteShuffle::new(settings(ScenarioKind::LockedDeleteShuffle, r"~\$.*"))
    }

    fn park_command(path: &str, shuffle_path: &str) -> Command {
        Command::soft_rename(&root(), path, shuffle_path)
            .with_post_commit(Command::capture(CaptureSlot::ParkedNode))
    }

    /// Park `path` and confirm the soft rename was applied
    fn park(instance: &mut dyn ScenarioInstance, path: &str) -> Option<Command> {
        let command = instance.evaluate(&delete(path));
        instance.accept_result(CaptureSlot::ParkedNode, &CommandResult::None);
        command
    }

    #[test]
    fn test_delete_is_parked_and_move_restores() {
        let (mut instance, first) = spawn(&scenario(), &create(r"\docs\~$report.docx"));
        assert_eq!(first, None);

        let parked = park(&mut *instance, r"\docs\report.docx");
        assert_eq!(
            parked,
            Some(park_command(r"\docs\report.docx", r"\docs\~shf-report.docx"))
        );

        let command = instance.evaluate(&move_file(r"\tmp\wrd1.tmp", r"\docs\report.docx"));
        assert_eq!(
            command,
            Some(Command::compound(vec![
                Command::soft_rename(&root(), r"\docs\~shf-report.docx", r"\docs\report.docx"),
                Command::copy_content(&root(), r"\tmp\wrd1.tmp", r"\docs\report.docx"),
                Command::delete(&root(), r"\tmp\wrd1.tmp"),
            ]))
        );
        assert!(!instance.is_complete());

        assert_eq!(instance.evaluate(&delete(r"\docs\~$report.docx")), None);
        assert!(instance.is_complete());
        assert_eq!(instance.dependent().unwrap().amend(Command::DoNothing), Command::DoNothing);
    }

    #[test]
    fn test_create_of_parked_file_reopens_it() {
        let (mut instance, _) = spawn(&scenario(), &create(r"\docs\~$report.docx"));
        park(&mut *instance, r"\docs\report.docx");

        let command = instance.evaluate(&create(r"\docs\report.docx"));
        assert_eq!(
            command,
            Some(Command::compound(vec![
                Command::soft_rename(&root(), r"\docs\~shf-report.docx", r"\docs\report.docx"),
                Command::open(&root(), r"\docs\report.docx", OpenFileMode::ReadWrite, true),
            ]))
        );
    }

    #[test]
    fn test_unconfirmed_park_is_forgotten() {
        let (mut instance, _) = spawn(&scenario(), &create(r"\docs\~$report.docx"));
        assert!(instance.evaluate(&delete(r"\docs\788A1D3D.tmp")).is_some());

        let command = instance.evaluate(&create(r"\docs\788A1D3D.tmp"));
        assert_eq!(command, None);
        assert_eq!(instance.evaluate(&delete(r"\docs\~$report.docx")), None);
        assert_eq!(instance.dependent().unwrap().amend(Command::DoNothing), Command::DoNothing);
    }

    #[test]
    fn test_deletes_in_other_folders_pass_through() {
        let (mut instance, _) = spawn(&scenario(), &create(r"\docs\~$report.docx"));
        assert_eq!(instance.evaluate(&delete(r"\other\report.docx")), None);
        assert!(!instance.is_complete());
    }

    #[test]
    fn test_lock_deleted_deletes_parked_files() {
        let (mut instance, _) = spawn(&scenario(), &create(r"\docs\~$report.docx"));
        park(&mut *instance, r"\docs\notes.txt");

        assert_eq!(instance.evaluate(&delete(r"\docs\~$report.docx")), None);
        assert!(instance.is_complete());

        let lock_delete = Command::delete(&root(), r"\docs\~$report.docx");
        let amended = instance.dependent().unwrap().amend(lock_delete.clone());
        assert_eq!(
            amended,
            lock_delete.with_post_commit(Command::delete(&root(), r"\docs\~shf-notes.txt"))
        );
    }

    #[test]
    fn test_timeout_deletes_parked_files() {
        let mut short = settings(ScenarioKind::LockedDeleteShuffle, r"~\$.*");
        short.timeout = Duration::from_millis(200);
        let (mut instance, _) = spawn(&LockedDeleteShuffle::new(short), &create(r"\docs\~$a.docx"));
        park(&mut *instance, r"\docs\notes.txt");

        std::thread::sleep(Duration::from_millis(250));
        assert_eq!(instance.evaluate(&create(r"\docs\notes.txt")), None);
        assert!(instance.is_complete());

        let amended = instance.dependent().unwrap().amend(Command::DoNothing);
        assert_eq!(
            amended,
            Command::DoNothing.with_post_commit(Command::delete(&root(), r"\docs\~shf-notes.txt"))
        );
    }
}
