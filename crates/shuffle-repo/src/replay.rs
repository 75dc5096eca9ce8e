//! Replay of client operations through the engine and the repository
//!
//! The replayer plays the part of the protocol layer: it turns trace steps into
//! operations, asks the evaluator for a command, applies the command to the
//! in-memory repository and feeds captured results back to the engine. Each
//! folder gets its own evaluator context, all sharing one session store.

use crate::error::{Error, Result};
use crate::repository::{Entry, MemoryRepository, path_key};
use crate::trace::{Expectation, Trace, TraceStep};
use serde::Serialize;
use shuffle_model::{
    Command, CommandResult, FileHandle, NodeRef, Operation, OperationExecutor, parent_path,
};
use shuffle_rules::{EvaluatorContext, InstanceSummary, RuleEvaluator, RulesConfig, SessionContext};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome of one operation
#[derive(Debug)]
pub struct Applied {
    pub command: Command,
    pub outcome: shuffle_model::Result<CommandResult>,
}

/// What happened at one trace step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of replaying a whole trace
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub name: String,
    pub steps: Vec<StepRecord>,
    pub failures: Vec<String>,
    pub listing: Vec<Entry>,
    pub live_instances: Vec<InstanceSummary>,
}

impl ReplayReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Error out when any expectation failed
    pub fn ensure_passed(&self) -> Result<()> {
        if self.passed() {
            return Ok(());
        }
        Err(Error::ExpectationsFailed {
            name: self.name.clone(),
            failures: self.failures.len(),
        })
    }
}

/// Drives operations through a [`RuleEvaluator`] and a [`MemoryRepository`]
#[derive(Debug)]
pub struct Replayer {
    evaluator: RuleEvaluator,
    session: SessionContext,
    contexts: HashMap<String, EvaluatorContext>,
    repository: MemoryRepository,
    /// Open handles by normalized client path, most recent last
    handles: HashMap<String, Vec<FileHandle>>,
    /// Nodes created from trace seeds, by normalized path
    seeded: HashMap<String, NodeRef>,
}

impl Replayer {
    pub fn new(evaluator: RuleEvaluator, session: SessionContext) -> Self {
        Self {
            evaluator,
            session,
            contexts: HashMap::new(),
            repository: MemoryRepository::new(),
            handles: HashMap::new(),
            seeded: HashMap::new(),
        }
    }

    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let evaluator = RuleEvaluator::from_config(config)?;
        Ok(Self::new(evaluator, config.session_context()))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_config(&RulesConfig::builtin())
    }

    pub fn repository(&self) -> &MemoryRepository {
        &self.repository
    }

    pub fn root(&self) -> NodeRef {
        self.repository.root().clone()
    }

    /// Live instances across every folder context
    pub fn summaries(&self) -> Vec<InstanceSummary> {
        let mut folders: Vec<_> = self.contexts.iter().collect();
        folders.sort_by(|a, b| a.0.cmp(b.0));
        folders
            .into_iter()
            .flat_map(|(_, context)| context.summaries())
            .collect()
    }

    /// Seed a file and remember its node for identity checks
    pub fn seed(&mut self, path: &str, content: &[u8]) -> Result<NodeRef> {
        let node = self.repository.seed(path, content)?;
        self.seeded.insert(path_key(path), node.clone());
        Ok(node)
    }

    /// Evaluate `operation`, execute the chosen command and track handles.
    pub fn apply(&mut self, operation: &Operation) -> Applied {
        let folder = path_key(context_folder(operation));
        let context = self
            .contexts
            .entry(folder)
            .or_insert_with(|| self.evaluator.create_context(&self.session));

        let command = self.evaluator.evaluate(context, operation);
        let outcome = self.repository.execute(&command, &*context);

        match &outcome {
            Ok(result) => {
                if !command.renames().is_empty() {
                    self.evaluator.notify_rename(context, operation, &command);
                }
                self.track(operation, result);
            }
            Err(err) => warn!(operation = %operation, error = %err, "command failed"),
        }
        Applied { command, outcome }
    }

    fn track(&mut self, operation: &Operation, result: &CommandResult) {
        match operation {
            Operation::Create(_) | Operation::Open(_) => {
                if let Some(file) = result.file() {
                    self.handles
                        .entry(path_key(operation.path()))
                        .or_default()
                        .push(file.clone());
                }
            }
            Operation::Rename(rename) => self.rekey(&rename.from_path, &rename.to_path),
            Operation::Move(moved) => self.rekey(&moved.from_path, &moved.to_path),
            Operation::Delete(_) | Operation::Close(_) => {}
        }
    }

    fn rekey(&mut self, from: &str, to: &str) {
        if let Some(moved) = self.handles.remove(&path_key(from)) {
            self.handles.entry(path_key(to)).or_default().extend(moved);
        }
    }

    fn take_handle(&mut self, path: &str) -> Result<FileHandle> {
        let key = path_key(path);
        let handle = self.handles.get_mut(&key).and_then(Vec::pop);
        if self.handles.get(&key).is_some_and(Vec::is_empty) {
            self.handles.remove(&key);
        }
        handle.ok_or_else(|| Error::NoOpenHandle {
            path: path.to_string(),
        })
    }

    pub fn create(&mut self, path: &str) -> Applied {
        let operation = Operation::create(self.root(), path);
        self.apply(&operation)
    }

    pub fn delete(&mut self, path: &str) -> Applied {
        let operation = Operation::delete(self.root(), path);
        self.apply(&operation)
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Applied {
        let operation = Operation::rename(self.root(), from, to);
        self.apply(&operation)
    }

    pub fn move_file(&mut self, from: &str, to: &str) -> Applied {
        let operation = Operation::move_file(self.root(), from, to);
        self.apply(&operation)
    }

    pub fn open(&mut self, path: &str, mode: shuffle_model::OpenFileMode, truncate: bool) -> Applied {
        let mut operation = Operation::open(self.root(), path, mode);
        if let Operation::Open(open) = &mut operation {
            open.truncate = truncate;
        }
        self.apply(&operation)
    }

    /// Close the most recently opened handle for `path`
    pub fn close(&mut self, path: &str) -> Result<Applied> {
        let file = self.take_handle(path)?;
        let operation = Operation::close(self.root(), path, file);
        Ok(self.apply(&operation))
    }

    /// Run one trace step
    pub fn run_step(&mut self, step: &TraceStep) -> Result<StepRecord> {
        let applied = match step {
            TraceStep::Write { path, content } => {
                let error = self
                    .repository
                    .write(path, content.as_bytes())
                    .err()
                    .map(|err| err.to_string());
                return Ok(StepRecord {
                    step: step.to_string(),
                    command: None,
                    error,
                });
            }
            TraceStep::Create { path } => self.create(path),
            TraceStep::Delete { path } => self.delete(path),
            TraceStep::Rename { from, to } => self.rename(from, to),
            TraceStep::Move { from, to } => self.move_file(from, to),
            TraceStep::Open {
                path,
                mode,
                truncate,
            } => self.open(path, *mode, *truncate),
            TraceStep::Close { path } => self.close(path)?,
        };
        Ok(StepRecord {
            step: step.to_string(),
            command: Some(applied.command),
            error: applied.outcome.err().map(|err| err.to_string()),
        })
    }

    /// Seed, run every step and check the expectations of `trace`
    pub fn replay(&mut self, trace: &Trace) -> Result<ReplayReport> {
        let name = trace.display_name("unnamed").to_string();
        info!(trace = %name, steps = trace.steps.len(), "replaying trace");

        for seed in &trace.seeds {
            self.seed(&seed.path, seed.content.as_bytes())?;
            for (key, value) in &seed.properties {
                self.repository.set_property(&seed.path, key, value)?;
            }
        }

        let mut steps = Vec::with_capacity(trace.steps.len());
        for step in &trace.steps {
            let record = self.run_step(step)?;
            debug!(step = %record.step, command = ?record.command.as_ref().map(Command::label), "step replayed");
            steps.push(record);
        }

        let failures: Vec<String> = trace
            .expectations
            .iter()
            .flat_map(|expectation| self.check(expectation))
            .collect();
        if failures.is_empty() {
            info!(trace = %name, "all expectations met");
        } else {
            warn!(trace = %name, failures = failures.len(), "expectations not met");
        }

        Ok(ReplayReport {
            name,
            steps,
            failures,
            listing: self.repository.listing(),
            live_instances: self.summaries(),
        })
    }

    /// Failures for one expectation; empty when it holds
    pub fn check(&self, expectation: &Expectation) -> Vec<String> {
        let path = &expectation.path;
        let Some(node) = self.repository.node_at(path) else {
            if expectation.absent {
                return Vec::new();
            }
            return vec![format!("{path}: missing")];
        };
        if expectation.absent {
            return vec![format!("{path}: expected to be absent")];
        }

        let mut failures = Vec::new();
        if let Some(expected) = &expectation.content {
            let actual = self.repository.content(path).unwrap_or_default();
            if actual != expected.as_bytes() {
                failures.push(format!(
                    "{path}: expected content {expected:?}, found {:?}",
                    String::from_utf8_lossy(&actual)
                ));
            }
        }
        if let Some(seed) = &expectation.same_node_as {
            match self.seeded.get(&path_key(seed)) {
                Some(original) if *original == node => {}
                Some(original) => {
                    failures.push(format!("{path}: node {node} is not the seeded node {original}"))
                }
                None => failures.push(format!("{path}: {seed} was never seeded")),
            }
        }
        for (key, expected) in &expectation.properties {
            let actual = self.repository.property(path, key);
            if actual.as_deref() != Some(expected.as_str()) {
                failures.push(format!("{path}: property {key} expected {expected:?}, found {actual:?}"));
            }
        }
        failures
    }
}

/// Folder whose context handles `operation`; moves belong to their destination
fn context_folder(operation: &Operation) -> &str {
    match operation {
        Operation::Move(moved) => parent_path(&moved.to_path),
        other => parent_path(other.path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shuffle_model::OpenFileMode;

    #[test]
    fn test_moves_are_routed_by_destination() {
        let root = NodeRef::new("root");
        let op = Operation::move_file(root.clone(), r"\tmp\a.txt", r"\docs\a.txt");
        assert_eq!(context_folder(&op), r"\docs");
        let op = Operation::rename(root, r"\tmp\a.txt", r"\tmp\b.txt");
        assert_eq!(context_folder(&op), r"\tmp");
    }

    #[test]
    fn test_create_write_close_round_trip() {
        let mut replayer = Replayer::builtin().unwrap();
        let created = replayer.create(r"\docs\a.txt");
        assert!(created.outcome.is_ok());
        replayer.repository().write(r"\docs\a.txt", b"hello").unwrap();
        assert_eq!(replayer.repository().open_handles(), 1);

        let closed = replayer.close(r"\docs\a.txt").unwrap();
        assert!(closed.outcome.is_ok());
        assert_eq!(replayer.repository().open_handles(), 0);
        assert_eq!(replayer.repository().content(r"\docs\a.txt"), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_reopen_shares_one_repository_handle() {
        let mut replayer = Replayer::builtin().unwrap();
        replayer.seed(r"\a.txt", b"v1").unwrap();
        replayer.open(r"\a.txt", OpenFileMode::ReadWrite, false);
        let again = replayer.open(r"\a.txt", OpenFileMode::ReadWrite, false);
        assert!(matches!(again.command, Command::ReturnValue(_)));
        assert_eq!(replayer.repository().open_handles(), 1);

        assert_eq!(replayer.close(r"\a.txt").unwrap().command, Command::DoNothing);
        assert_eq!(replayer.repository().open_handles(), 1);
        replayer.close(r"\a.txt").unwrap();
        assert_eq!(replayer.repository().open_handles(), 0);
    }

    #[test]
    fn test_close_without_open_is_an_error() {
        let mut replayer = Replayer::builtin().unwrap();
        assert!(matches!(
            replayer.close(r"\a.txt"),
            Err(Error::NoOpenHandle { .. })
        ));
    }

    #[test]
    fn test_failed_command_is_recorded() {
        let mut replayer = Replayer::builtin().unwrap();
        let record = replayer
            .run_step(&TraceStep::Rename {
                from: r"\missing.txt".to_string(),
                to: r"\b.txt".to_string(),
            })
            .unwrap();
        assert!(record.error.is_some());
        assert_eq!(record.command, Some(Command::rename(&replayer.root(), r"\missing.txt", r"\b.txt")));
    }

    #[test]
    fn test_expectations_report_failures() {
        let mut replayer = Replayer::builtin().unwrap();
        replayer.seed(r"\a.txt", b"v1").unwrap();
        let failures = replayer.check(&Expectation {
            path: r"\a.txt".to_string(),
            content: Some("v2".to_string()),
            ..Expectation::default()
        });
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("expected content"));

        let failures = replayer.check(&Expectation {
            path: r"\b.txt".to_string(),
            absent: true,
            ..Expectation::default()
        });
        assert!(failures.is_empty());
    }
}
