use std::time::Duration;

use harvest_engine::{InputSnapshot, ScheduledTaskQueue};
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::combat::{CombatResolver, OverlapPair};
use super::config::RunConfig;
use super::context::RunContext;
use super::events::{RunEvent, RunEventBus, RunEventCounts};
use super::loadout::{Ability, ResolvedLoadout};
use super::physics;
use super::profile::Account;
use super::progression::{ProgressionTracker, UpgradeKind};
use super::snapshot::HudSnapshot;
use super::spawn::SpawnDirector;
use super::state::{RunPhase, RunState};
use super::tasks::TaskKind;
use super::world::RunWorld;

struct RunRules<'a> {
    spawner: &'a mut SpawnDirector,
    progression: &'a mut ProgressionTracker,
    combat: &'a CombatResolver,
}

/// One run from start to a terminal phase. Owns every pool, the run state,
/// the task queue and the account it settles into.
#[derive(Debug)]
pub struct RunSimulation {
    config: RunConfig,
    loadout: ResolvedLoadout,
    world: RunWorld,
    state: RunState,
    tasks: ScheduledTaskQueue<TaskKind>,
    rng: StdRng,
    account: Account,
    events: RunEventBus,
    spawner: SpawnDirector,
    progression: ProgressionTracker,
    combat: CombatResolver,
    ticks: u64,
}

impl RunSimulation {
    pub fn start(config: RunConfig, account: Account, rng: StdRng) -> Self {
        let loadout = account.profile().resolved_loadout();
        let state = RunState::new(&config, &loadout);

        let mut tasks = ScheduledTaskQueue::new();
        tasks.schedule_every(config.enemy.spawn_interval(), TaskKind::EnemyWave);
        tasks.schedule_every(config.courier.roll_interval(), TaskKind::CourierRoll);
        tasks.schedule_every(state.fire_interval, TaskKind::AutoFire);
        if loadout.ability == Ability::Heal {
            tasks.schedule_every(config.heal.interval(), TaskKind::PassiveHeal);
        }

        info!(
            weapon = loadout.weapon.name,
            ability = loadout.ability.name(),
            max_health = state.max_health,
            magazine = state.max_ammo,
            "run_started"
        );

        Self {
            world: RunWorld::new(&config),
            config,
            loadout,
            state,
            tasks,
            rng,
            account,
            events: RunEventBus::default(),
            spawner: SpawnDirector::default(),
            progression: ProgressionTracker::default(),
            combat: CombatResolver::default(),
            ticks: 0,
        }
    }

    /// Advances one fixed step. Nothing but an upgrade pick is read while
    /// the run is paused or over.
    pub fn tick(&mut self, dt: Duration, input: &InputSnapshot) {
        self.ticks = self.ticks.saturating_add(1);
        if let Some(choice) = input.upgrade_choice() {
            self.choose_upgrade(choice);
        }

        if self.state.machine.is_active() {
            self.step_world(dt, input);
        }
        self.events.finish_tick_rollover();
    }

    fn step_world(&mut self, dt: Duration, input: &InputSnapshot) {
        let dt_seconds = dt.as_secs_f32();
        physics::move_player(
            &mut self.world,
            &self.config,
            input.move_axes(),
            self.state.move_speed,
            dt_seconds,
        );

        for task in self.tasks.advance(dt) {
            self.run_task(task.kind);
        }
        if !self.state.machine.is_active() {
            return;
        }

        physics::advance_enemies(&mut self.world, dt_seconds);
        physics::advance_projectiles(&mut self.world, &self.config, dt_seconds);
        let pairs = physics::detect_overlaps(&self.world, &self.config);
        self.resolve_overlaps(&pairs);
    }

    fn run_task(&mut self, kind: TaskKind) {
        let (mut ctx, rules) = self.parts();
        match kind {
            TaskKind::EnemyWave => {
                rules.spawner.spawn_enemy(&mut ctx);
            }
            TaskKind::CourierRoll => {
                rules.spawner.roll_courier(&mut ctx);
            }
            TaskKind::AutoFire => {
                rules.combat.auto_fire(&mut ctx);
            }
            TaskKind::PassiveHeal => passive_heal(&mut ctx),
            TaskKind::ReloadComplete => rules.combat.finish_reload(&mut ctx),
            TaskKind::InvulnerabilityEnd => rules.combat.end_invulnerability(&mut ctx),
            TaskKind::CourierDespawn { courier } => {
                rules.spawner.despawn_courier(&mut ctx, courier);
            }
        }
    }

    /// Resolves overlaps in order. Accepts pairs from any collision source;
    /// the built-in physics feeds it once per tick.
    pub fn resolve_overlaps(&mut self, pairs: &[OverlapPair]) {
        let (mut ctx, rules) = self.parts();
        for pair in pairs {
            rules
                .combat
                .resolve(&mut ctx, rules.progression, rules.spawner, *pair);
        }
    }

    pub fn choose_upgrade(&mut self, index: usize) -> Option<UpgradeKind> {
        let (mut ctx, rules) = self.parts();
        let chosen = rules.progression.choose_upgrade(&mut ctx, index);
        if chosen.is_none() {
            debug!(index, phase = ?self.state.phase(), "upgrade_choice_ignored");
        }
        chosen
    }

    fn parts(&mut self) -> (RunContext<'_>, RunRules<'_>) {
        (
            RunContext {
                config: &self.config,
                world: &mut self.world,
                state: &mut self.state,
                tasks: &mut self.tasks,
                rng: &mut self.rng,
                account: &mut self.account,
                events: &mut self.events,
            },
            RunRules {
                spawner: &mut self.spawner,
                progression: &mut self.progression,
                combat: &self.combat,
            },
        )
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn world(&self) -> &RunWorld {
        &self.world
    }

    /// For external physics that integrates positions itself.
    pub fn world_mut(&mut self) -> &mut RunWorld {
        &mut self.world
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn loadout(&self) -> &ResolvedLoadout {
        &self.loadout
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn into_account(self) -> Account {
        self.account
    }

    pub fn upgrade_options(&self) -> &[UpgradeKind] {
        self.progression.pending_options()
    }

    pub fn portal_opened(&self) -> bool {
        self.spawner.portal_opened()
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::capture(&self.state, self.progression.pending_options())
    }

    pub fn last_tick_events(&self) -> &[RunEvent] {
        self.events.last_tick_events()
    }

    pub fn last_tick_counts(&self) -> RunEventCounts {
        self.events.last_tick_counts()
    }

    /// Simulated time spent in the Active phase.
    pub fn elapsed(&self) -> Duration {
        self.tasks.now()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    #[cfg(test)]
    pub(crate) fn with_context<R>(
        &mut self,
        visit: impl FnOnce(&mut RunContext<'_>, &mut ProgressionTracker, &mut SpawnDirector) -> R,
    ) -> R {
        let (mut ctx, rules) = self.parts();
        visit(&mut ctx, rules.progression, rules.spawner)
    }
}

fn passive_heal(ctx: &mut RunContext<'_>) {
    if !ctx.state.machine.is_active() {
        return;
    }
    let restored = ctx.state.heal(ctx.config.heal.amount);
    if restored > 0 {
        ctx.emit(RunEvent::PlayerHealed { amount: restored });
    }
}
