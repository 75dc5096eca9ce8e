//! Helpers shared by the evaluator tests

#![allow(dead_code)]

use shuffle_model::{
    CaptureSlot, Command, CommandResult, FileHandle, NetworkFile, NodeRef, OpenFileMode, Operation,
    ResultSink, file_name,
};
use shuffle_rules::{EvaluatorContext, RuleEvaluator, RulesConfig, SessionContext};

pub fn root() -> NodeRef {
    NodeRef::new("root")
}

pub fn create(path: &str) -> Operation {
    Operation::create(root(), path)
}

pub fn delete(path: &str) -> Operation {
    Operation::delete(root(), path)
}

pub fn rename(from: &str, to: &str) -> Operation {
    Operation::rename(root(), from, to)
}

pub fn move_file(from: &str, to: &str) -> Operation {
    Operation::move_file(root(), from, to)
}

pub fn open(path: &str, mode: OpenFileMode) -> Operation {
    Operation::open(root(), path, mode)
}

pub fn close(file: &FileHandle) -> Operation {
    Operation::close(root(), file.full_path(), file.clone())
}

#[derive(Debug)]
struct TestFile {
    path: String,
    read_only: bool,
}

impl NetworkFile for TestFile {
    fn name(&self) -> &str {
        file_name(&self.path)
    }

    fn full_path(&self) -> &str {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn has_delete_on_close(&self) -> bool {
        false
    }
}

pub fn handle(path: &str, read_only: bool) -> FileHandle {
    FileHandle::new(TestFile {
        path: path.to_string(),
        read_only,
    })
}

/// Evaluator plus one context, answering captures with a fixed node
pub struct Driver {
    pub evaluator: RuleEvaluator,
    pub context: EvaluatorContext,
    next_node: u32,
}

impl Driver {
    pub fn builtin() -> Self {
        Self::new(RuleEvaluator::builtin().unwrap())
    }

    pub fn from_toml(content: &str) -> Self {
        let config = RulesConfig::parse(content).unwrap();
        Self::new(RuleEvaluator::from_config(&config).unwrap())
    }

    pub fn new(evaluator: RuleEvaluator) -> Self {
        let context = evaluator.create_context(&SessionContext::new());
        Self {
            evaluator,
            context,
            next_node: 0,
        }
    }

    /// Evaluate `operation` and satisfy any captures: handle slots get a
    /// handle on the operation's path, the others a fresh node.
    pub fn run(&mut self, operation: &Operation) -> Command {
        let command = self.evaluator.evaluate(&self.context, operation);
        if let Command::Compound(compound) = &command {
            for post in &compound.post_commit {
                if let Command::Capture(capture) = post {
                    let result = match capture.slot {
                        CaptureSlot::ReadOnlyHandle => {
                            CommandResult::File(handle(operation.path(), true))
                        }
                        CaptureSlot::ReadWriteHandle => {
                            CommandResult::File(handle(operation.path(), false))
                        }
                        CaptureSlot::ArchivedNode | CaptureSlot::ParkedNode => {
                            self.next_node += 1;
                            CommandResult::Node(NodeRef::new(format!("node-{}", self.next_node)))
                        }
                    };
                    self.context.accept(capture, &result);
                }
            }
        }
        command
    }

    pub fn live(&self) -> usize {
        self.context.live_count()
    }
}

/// Primary commands of a compound, or the command itself
pub fn primaries(command: &Command) -> Vec<&'static str> {
    match command {
        Command::Compound(compound) => compound.commands.iter().map(Command::label).collect(),
        other => vec![other.label()],
    }
}
