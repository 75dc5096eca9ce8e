//! Bookkeeping shared by the scenario state machines

use super::{Ranking, ScenarioKind, ScenarioSettings};
use shuffle_model::Command;
use std::time::{Duration, Instant};
use tracing::debug;

/// Expiry clock for a scenario instance.
///
/// The clock starts when the instance is created. The first check observes
/// the triggering operation and never expires, so even a zero timeout lets an
/// instance see its trigger.
#[derive(Debug)]
pub(crate) struct ShuffleTimer {
    timeout: Duration,
    started: Instant,
    armed: bool,
}

impl ShuffleTimer {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            started: Instant::now(),
            armed: false,
        }
    }

    pub(crate) fn expired(&mut self) -> bool {
        if !self.armed {
            self.armed = true;
            return false;
        }
        self.started.elapsed() >= self.timeout
    }
}

/// Ranking, completion flag and timer of one instance
#[derive(Debug)]
pub(crate) struct InstanceCore {
    kind: ScenarioKind,
    ranking: Ranking,
    timer: ShuffleTimer,
    complete: bool,
}

impl InstanceCore {
    pub(crate) fn new(kind: ScenarioKind, settings: &ScenarioSettings) -> Self {
        Self {
            kind,
            ranking: settings.ranking,
            timer: ShuffleTimer::new(settings.timeout),
            complete: false,
        }
    }

    pub(crate) fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub(crate) fn ranking(&self) -> Ranking {
        self.ranking
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    /// Marks the instance complete once its timeout has elapsed.
    pub(crate) fn timed_out(&mut self) -> bool {
        if self.timer.expired() {
            debug!(scenario = %self.kind, "instance timed out");
            self.complete = true;
        }
        self.complete
    }

    pub(crate) fn finish(&mut self) {
        debug!(scenario = %self.kind, "instance finished");
        self.complete = true;
    }

    /// Abandon the shuffle; the operation is left to other instances.
    pub(crate) fn abort(&mut self, reason: &str) -> Option<Command> {
        debug!(scenario = %self.kind, reason, "instance abandoned");
        self.complete = true;
        None
    }
}
