//! The rule evaluator
//!
//! For every operation the evaluator:
//!
//! 1. offers the operation to each scenario, in configuration order, so it can
//!    spawn a new instance (later scenarios see earlier spawns),
//! 2. feeds the operation to every live instance, in configuration order of
//!    their scenarios, and collects their answers,
//! 3. picks the answer with the highest ranking; at equal ranking the later
//!    instance wins,
//! 4. lets the other instances amend the winning command with work they
//!    still owe (captures, cleanup), and
//! 5. drops completed instances.

use crate::config::RulesConfig;
use crate::context::{EvaluatorContext, ScenarioContext};
use crate::error::Result;
use crate::registry;
use crate::scenario::{DefaultScenario, Ranking, Scenario, ScenarioKind};
use crate::session::SessionContext;
use shuffle_model::{Command, CommandResult, Operation, ResultCapture};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Turns operations into repository commands using a fixed set of scenarios
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    scenarios: Vec<Arc<dyn Scenario>>,
}

impl RuleEvaluator {
    /// Build an evaluator; a default scenario is appended when none is given.
    pub fn new(mut scenarios: Vec<Arc<dyn Scenario>>) -> Self {
        if !scenarios.iter().any(|s| s.kind() == ScenarioKind::Default) {
            scenarios.push(Arc::new(DefaultScenario::default()));
        }
        Self { scenarios }
    }

    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        Ok(Self::new(registry::build_scenarios(config)?))
    }

    /// Evaluator for the shipped rules
    pub fn builtin() -> Result<Self> {
        Self::from_config(&RulesConfig::builtin())
    }

    pub fn scenarios(&self) -> &[Arc<dyn Scenario>] {
        &self.scenarios
    }

    pub fn create_context(&self, session: &SessionContext) -> EvaluatorContext {
        EvaluatorContext::new(session)
    }

    /// Decide which command carries out `operation`. Never fails.
    pub fn evaluate(&self, context: &EvaluatorContext, operation: &Operation) -> Command {
        let mut state = context.lock();

        for (order, scenario) in self.scenarios.iter().enumerate() {
            let spawned = {
                let view = ScenarioContext::new(&state.live, context.session_store());
                scenario.create_instance(&view, operation)
            };
            if let Some(instance) = spawned {
                let ticket = state.admit(order, instance);
                trace!(scenario = %scenario.kind(), ticket = ticket.id(), "instance admitted");
            }
        }

        let mut answers: Vec<Option<(Ranking, Command)>> = Vec::with_capacity(state.live.len());
        for live in state.live.iter_mut() {
            let answer = live.instance.evaluate(operation).map(|mut command| {
                command.stamp_captures(live.ticket);
                (live.instance.ranking(), command)
            });
            answers.push(answer);
        }

        let winner_index = select_winner(&answers);
        let mut winner = winner_index.and_then(|index| answers[index].take().map(|(_, command)| command));

        if let Some(mut command) = winner.take() {
            for (index, live) in state.live.iter_mut().enumerate() {
                if Some(index) == winner_index {
                    continue;
                }
                if let Some(dependent) = live.instance.dependent() {
                    let mut amended = dependent.amend(command);
                    amended.stamp_captures(live.ticket);
                    command = amended;
                }
            }
            winner = Some(command);
        }

        state.live.retain(|live| {
            let complete = live.instance.is_complete();
            if complete {
                trace!(scenario = %live.instance.kind(), ticket = live.ticket.id(), "instance removed");
            }
            !complete
        });

        match winner {
            Some(command) => {
                debug!(operation = %operation, command = command.label(), "operation evaluated");
                command
            }
            None => {
                warn!(operation = %operation, "no scenario answered; doing nothing");
                Command::DoNothing
            }
        }
    }

    /// Let live instances follow a rename carried out by `command`.
    pub fn notify_rename(&self, context: &EvaluatorContext, operation: &Operation, command: &Command) {
        let mut state = context.lock();
        for live in state.live.iter_mut() {
            if let Some(observer) = live.instance.rename_observer() {
                observer.notify_rename(operation, command);
            }
        }
    }

    /// Hand a captured result back to the instance that asked for it.
    pub fn deliver(&self, context: &EvaluatorContext, capture: &ResultCapture, result: &CommandResult) {
        context.deliver(capture, result);
    }
}

/// Index of the winning answer: highest ranking, later answers win ties.
fn select_winner(answers: &[Option<(Ranking, Command)>]) -> Option<usize> {
    let mut best: Option<(usize, Ranking)> = None;
    for (index, answer) in answers.iter().enumerate() {
        let Some((ranking, _)) = answer else {
            continue;
        };
        match best {
            Some((_, best_ranking)) if *ranking < best_ranking => {}
            Some((previous, best_ranking)) if *ranking == best_ranking => {
                debug!(replaced = previous, by = index, %ranking, "equal ranking; later answer wins");
                best = Some((index, *ranking));
            }
            _ => best = Some((index, *ranking)),
        }
    }
    best.map(|(index, _)| index)
}
