use harvest_engine::ScheduledTaskQueue;
use rand::rngs::StdRng;

use super::config::RunConfig;
use super::events::{RunEvent, RunEventBus};
use super::profile::Account;
use super::state::RunState;
use super::tasks::TaskKind;
use super::world::RunWorld;

/// Mutable view over one run handed to each rule component in turn.
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub world: &'a mut RunWorld,
    pub state: &'a mut RunState,
    pub tasks: &'a mut ScheduledTaskQueue<TaskKind>,
    pub rng: &'a mut StdRng,
    pub account: &'a mut Account,
    pub events: &'a mut RunEventBus,
}

impl RunContext<'_> {
    pub fn emit(&mut self, event: RunEvent) {
        self.events.emit(event);
    }

    /// Cancels every pending task. Called on entering a terminal phase.
    pub fn halt_timers(&mut self) {
        let cancelled = self.tasks.len();
        self.tasks.clear();
        tracing::debug!(cancelled, "run_timers_halted");
    }
}
