//! Per-session evaluation state
//!
//! An [`EvaluatorContext`] owns the live scenario instances for one session
//! folder. Its mutex serializes evaluation within the context; different
//! contexts never contend.

use crate::scenario::{Ranking, ScenarioInstance, ScenarioKind};
use crate::session::{SessionContext, SessionStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shuffle_model::{CommandResult, InstanceTicket, ResultCapture, ResultSink, names_match};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// A live instance and the ticket that addresses it
#[derive(Debug)]
pub(crate) struct LiveInstance {
    pub(crate) ticket: InstanceTicket,
    /// Position of the spawning scenario in the configuration
    pub(crate) order: usize,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) instance: Box<dyn ScenarioInstance>,
}

impl LiveInstance {
    pub(crate) fn new(ticket: InstanceTicket, order: usize, instance: Box<dyn ScenarioInstance>) -> Self {
        Self {
            ticket,
            order,
            created_at: Utc::now(),
            instance,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ContextState {
    pub(crate) live: Vec<LiveInstance>,
    next_ticket: u64,
}

impl ContextState {
    /// Insert `instance` and return its ticket.
    ///
    /// The live set stays sorted by configuration order; instances of the
    /// same scenario keep their arrival order.
    pub(crate) fn admit(&mut self, order: usize, instance: Box<dyn ScenarioInstance>) -> InstanceTicket {
        self.next_ticket += 1;
        let ticket = InstanceTicket::new(self.next_ticket);
        let at = self.live.partition_point(|live| live.order <= order);
        self.live.insert(at, LiveInstance::new(ticket, order, instance));
        ticket
    }
}

/// Diagnostic view of one live instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub kind: ScenarioKind,
    pub subject: Option<String>,
    pub ranking: Ranking,
    pub created_at: DateTime<Utc>,
}

/// Live instances of one session folder
#[derive(Debug)]
pub struct EvaluatorContext {
    state: Mutex<ContextState>,
    session: Arc<SessionStore>,
}

impl EvaluatorContext {
    pub(crate) fn new(session: &SessionContext) -> Self {
        Self {
            state: Mutex::new(ContextState::default()),
            session: Arc::clone(session.store()),
        }
    }

    /// Lock the live set. A panic in another holder does not poison the context.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn session_store(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    pub fn summaries(&self) -> Vec<InstanceSummary> {
        self.lock()
            .live
            .iter()
            .map(|live| InstanceSummary {
                kind: live.instance.kind(),
                subject: live.instance.subject().map(str::to_string),
                ranking: live.instance.ranking(),
                created_at: live.created_at,
            })
            .collect()
    }

    /// Hand a captured result to the instance that asked for it.
    ///
    /// Results for instances that have already completed are dropped.
    pub(crate) fn deliver(&self, capture: &ResultCapture, result: &CommandResult) {
        let Some(ticket) = capture.ticket else {
            warn!(slot = ?capture.slot, "capture without a ticket dropped");
            return;
        };
        let mut state = self.lock();
        match state.live.iter_mut().find(|live| live.ticket == ticket) {
            Some(live) => {
                debug!(ticket = ticket.id(), slot = ?capture.slot, "delivering captured result");
                live.instance.accept_result(capture.slot, result);
            }
            None => debug!(ticket = ticket.id(), "capture for finished instance dropped"),
        }
    }
}

impl ResultSink for EvaluatorContext {
    fn accept(&self, capture: &ResultCapture, result: &CommandResult) {
        self.deliver(capture, result);
    }
}

/// Read-only view offered to scenarios while they decide whether to spawn
#[derive(Debug)]
pub struct ScenarioContext<'a> {
    live: &'a [LiveInstance],
    session: &'a Arc<SessionStore>,
}

impl<'a> ScenarioContext<'a> {
    pub(crate) fn new(live: &'a [LiveInstance], session: &'a Arc<SessionStore>) -> Self {
        Self { live, session }
    }

    /// A view with no live instances, for driving a scenario on its own
    pub fn detached(session: &'a Arc<SessionStore>) -> Self {
        Self { live: &[], session }
    }

    /// Whether a live instance of `kind` is already following `name`
    pub fn is_tracking(&self, kind: ScenarioKind, name: &str) -> bool {
        self.live.iter().any(|live| {
            live.instance.kind() == kind
                && !live.instance.is_complete()
                && live.instance.subject().is_some_and(|subject| names_match(subject, name))
        })
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn session(&self) -> &'a Arc<SessionStore> {
        self.session
    }
}
