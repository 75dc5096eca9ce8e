//! Open-file reference counting
//!
//! Clients often open the same file many times. One instance per file keeps a
//! read-only and a read-write slot; only the first open of a slot reaches the
//! repository and only the last close of a slot really closes the file.

use super::{
    DependentInstance, InstanceCore, Ranking, RenameObserver, Scenario, ScenarioInstance,
    ScenarioKind, ScenarioSettings, close_command,
};
use crate::context::ScenarioContext;
use shuffle_model::{
    CaptureSlot, CloseFileOperation, Command, CommandResult, FileHandle, OpenFileMode,
    Operation, file_name, names_match, paths_match,
};
use tracing::debug;

#[derive(Debug)]
pub struct OpenFileScenario {
    settings: ScenarioSettings,
}

impl OpenFileScenario {
    pub fn new(settings: ScenarioSettings) -> Self {
        Self { settings }
    }
}

impl Scenario for OpenFileScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::OpenFile
    }

    fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    fn create_instance(
        &self,
        context: &ScenarioContext<'_>,
        operation: &Operation,
    ) -> Option<Box<dyn ScenarioInstance>> {
        let (name, path) = match operation {
            Operation::Create(create) => (&create.name, &create.path),
            Operation::Open(open) if slot_for_mode(open.mode).is_some() => (&open.name, &open.path),
            _ => return None,
        };
        if !self.settings.pattern.matches(name) || context.is_tracking(self.kind(), name) {
            return None;
        }
        debug!(name = %name, "open-file tracking started");
        Some(Box::new(OpenFileInstance {
            core: InstanceCore::new(self.kind(), &self.settings),
            name: name.clone(),
            path: path.clone(),
            read_only: Slot::default(),
            read_write: Slot::default(),
            pending: None,
        }))
    }
}

fn slot_for_mode(mode: OpenFileMode) -> Option<CaptureSlot> {
    match mode {
        OpenFileMode::ReadOnly => Some(CaptureSlot::ReadOnlyHandle),
        OpenFileMode::WriteOnly | OpenFileMode::ReadWrite => Some(CaptureSlot::ReadWriteHandle),
        OpenFileMode::Delete | OpenFileMode::AttributesOnly => None,
    }
}

#[derive(Debug, Default)]
struct Slot {
    count: u32,
    handle: Option<FileHandle>,
}

#[derive(Debug)]
struct OpenFileInstance {
    core: InstanceCore,
    name: String,
    path: String,
    read_only: Slot,
    read_write: Slot,
    /// Capture owed to the winning command of the current operation
    pending: Option<CaptureSlot>,
}

impl OpenFileInstance {
    fn slot_mut(&mut self, slot: CaptureSlot) -> &mut Slot {
        match slot {
            CaptureSlot::ReadOnlyHandle => &mut self.read_only,
            _ => &mut self.read_write,
        }
    }

    fn idle(&self) -> bool {
        self.read_only.count == 0 && self.read_write.count == 0
    }

    /// Count an open; reuse the slot's handle when there is one.
    ///
    /// A re-open that arrives before the first open's handle was captured
    /// goes to the repository again and its capture fills the slot.
    fn open(&mut self, slot: CaptureSlot, command: Command) -> Command {
        let name = self.name.clone();
        let entry = self.slot_mut(slot);
        entry.count += 1;
        if entry.count > 1 {
            match entry.handle.clone() {
                Some(handle) => return Command::ReturnValue(CommandResult::File(handle)),
                None => {
                    debug!(name = %name, count = entry.count, "no captured handle yet; opening again");
                }
            }
        }
        self.pending = Some(slot);
        command.with_post_commit(Command::capture(slot))
    }

    fn close(&mut self, close: &CloseFileOperation) -> Command {
        let slot = if close.file.is_read_only() {
            CaptureSlot::ReadOnlyHandle
        } else {
            CaptureSlot::ReadWriteHandle
        };
        let entry = self.slot_mut(slot);
        if entry.count == 0 {
            debug!(name = %close.name, "close without matching open");
            return Command::DoNothing;
        }
        entry.count -= 1;
        let command = if entry.count == 0 {
            entry.handle = None;
            close_command(close)
        } else {
            Command::DoNothing
        };
        if self.idle() {
            self.core.finish();
        }
        command
    }
}

impl ScenarioInstance for OpenFileInstance {
    fn kind(&self) -> ScenarioKind {
        self.core.kind()
    }

    fn evaluate(&mut self, operation: &Operation) -> Option<Command> {
        self.pending = None;
        match operation {
            Operation::Create(create) if names_match(&create.name, &self.name) => {
                if !self.idle() {
                    return None;
                }
                let command = Command::CreateFile {
                    name: create.name.clone(),
                    root: create.root.clone(),
                    path: create.path.clone(),
                    allocation_size: create.allocation_size,
                    hidden: create.hidden,
                };
                Some(self.open(CaptureSlot::ReadWriteHandle, command))
            }
            Operation::Open(open) if names_match(&open.name, &self.name) => {
                let slot = slot_for_mode(open.mode)?;
                let command = Command::open(&open.root, &open.path, open.mode, open.truncate);
                Some(self.open(slot, command))
            }
            Operation::Close(close) if names_match(&close.name, &self.name) => {
                Some(self.close(close))
            }
            _ => None,
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
        let Some(file) = result.file() else {
            return;
        };
        let entry = self.slot_mut(slot);
        if entry.count > 0 {
            entry.handle = Some(file.clone());
        }
    }

    fn rename_observer(&mut self) -> Option<&mut dyn RenameObserver> {
        Some(self)
    }

    fn dependent(&mut self) -> Option<&mut dyn DependentInstance> {
        Some(self)
    }
}

impl RenameObserver for OpenFileInstance {
    fn notify_rename(&mut self, _operation: &Operation, command: &Command) {
        for (from, to) in command.renames() {
            if paths_match(from, &self.path) {
                debug!(from, to, "open file renamed");
                self.path = to.to_string();
                self.name = file_name(to).to_string();
            }
        }
    }
}

impl DependentInstance for OpenFileInstance {
    fn amend(&mut self, winner: Command) -> Command {
        match self.pending.take() {
            Some(slot) => winner.with_post_commit(Command::capture(slot)),
            None => winner,
        }
    }
}
