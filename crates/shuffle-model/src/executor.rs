//! Contract between the rule engine and the repository that applies commands

use crate::command::{Command, CommandResult, ResultCapture};
use crate::error::Result;

/// Receives captured results after a transaction commits.
///
/// The engine implements this on its per-session context; an executor calls
/// it for every [`Command::Capture`] found in a post-commit list, before the
/// next operation for that context is evaluated.
pub trait ResultSink {
    fn accept(&self, capture: &ResultCapture, result: &CommandResult);
}

/// Applies commands to a repository.
///
/// Implementations run a compound's primary commands inside one transaction,
/// then its post-commit commands on success or its post-error commands on
/// failure. The value returned is the result of the last primary command.
pub trait OperationExecutor {
    fn execute(&self, command: &Command, sink: &dyn ResultSink) -> Result<CommandResult>;
}

/// A sink that drops every result, for executors driven without an engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardResults;

impl ResultSink for DiscardResults {
    fn accept(&self, _capture: &ResultCapture, _result: &CommandResult) {}
}
