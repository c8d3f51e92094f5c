use std::time::Duration;

use tracing::debug;

use super::config::RunConfig;
use super::loadout::{Ability, ResolvedLoadout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Active,
    /// Waiting for an upgrade pick; the world is frozen.
    Paused,
    GameOver,
    Extracted,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::GameOver | RunPhase::Extracted)
    }
}

/// Phase transitions. Requests that do not fit the current phase are
/// rejected and leave the phase untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStateMachine {
    phase: RunPhase,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self {
            phase: RunPhase::Active,
        }
    }
}

impl RunStateMachine {
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == RunPhase::Active
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn pause_for_upgrade(&mut self) -> bool {
        self.transition(RunPhase::Active, RunPhase::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(RunPhase::Paused, RunPhase::Active)
    }

    pub fn game_over(&mut self) -> bool {
        self.transition(RunPhase::Active, RunPhase::GameOver)
    }

    pub fn extract(&mut self) -> bool {
        self.transition(RunPhase::Active, RunPhase::Extracted)
    }

    fn transition(&mut self, from: RunPhase, to: RunPhase) -> bool {
        if self.phase != from {
            debug!(current = ?self.phase, requested = ?to, "phase_transition_rejected");
            return false;
        }
        self.phase = to;
        true
    }
}

/// Mutable numbers of the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub health: u32,
    pub max_health: u32,
    pub invulnerable: bool,

    pub ammo: u32,
    pub max_ammo: u32,
    pub reloading: bool,
    pub fire_interval: Duration,
    pub reload_time: Duration,
    pub base_damage: u32,
    pub damage_multiplier: f32,
    pub move_speed: f32,

    pub level: u32,
    pub current_xp: u32,
    pub required_xp: u32,

    pub temp_gold: u32,
    pub collected_shards: u32,
    pub portal_active: bool,

    pub machine: RunStateMachine,
}

impl RunState {
    pub fn new(config: &RunConfig, loadout: &ResolvedLoadout) -> Self {
        let move_speed = match loadout.ability {
            Ability::Sprint => config.player.move_speed * config.player.sprint_multiplier,
            Ability::Heal => config.player.move_speed,
        };
        Self {
            health: config.player.max_health,
            max_health: config.player.max_health,
            invulnerable: false,
            ammo: loadout.weapon.magazine,
            max_ammo: loadout.weapon.magazine,
            reloading: false,
            fire_interval: loadout.weapon.fire_interval(),
            reload_time: loadout.weapon.reload_time(),
            base_damage: loadout.weapon.damage,
            damage_multiplier: 1.0,
            move_speed,
            level: 1,
            current_xp: 0,
            required_xp: config.progression.initial_required_xp,
            temp_gold: 0,
            collected_shards: 0,
            portal_active: false,
            machine: RunStateMachine::default(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.machine.phase()
    }

    pub fn projectile_damage(&self) -> u32 {
        (self.base_damage as f32 * self.damage_multiplier).round() as u32
    }

    /// Returns the health actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = self.health.saturating_add(amount).min(self.max_health);
        let restored = healed - self.health;
        self.health = healed;
        restored
    }

    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    pub fn xp_fraction(&self) -> f32 {
        if self.required_xp == 0 {
            return 0.0;
        }
        (self.current_xp as f32 / self.required_xp as f32).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases_reject_every_transition() {
        let mut machine = RunStateMachine::default();
        assert!(machine.game_over());

        assert!(!machine.pause_for_upgrade());
        assert!(!machine.resume());
        assert!(!machine.extract());
        assert!(!machine.game_over());
        assert_eq!(machine.phase(), RunPhase::GameOver);
    }

    #[test]
    fn paused_run_cannot_end_until_resumed() {
        let mut machine = RunStateMachine::default();
        assert!(machine.pause_for_upgrade());
        assert!(!machine.extract());
        assert!(!machine.game_over());

        assert!(machine.resume());
        assert!(machine.extract());
        assert_eq!(machine.phase(), RunPhase::Extracted);
    }

    #[test]
    fn heal_is_capped_at_max_health() {
        let config = RunConfig::default();
        let mut state = RunState::new(&config, &ResolvedLoadout::from_names("", ""));
        state.take_damage(5);

        assert_eq!(state.heal(25), 5);
        assert_eq!(state.health, state.max_health);
    }

    #[test]
    fn sprint_scales_starting_move_speed() {
        let config = RunConfig::default();
        let sprint = RunState::new(&config, &ResolvedLoadout::from_names("Rusty Sword", "Sprint"));
        let heal = RunState::new(&config, &ResolvedLoadout::from_names("Rusty Sword", "Heal"));

        assert!((sprint.move_speed - 312.5).abs() < 1e-3);
        assert!((heal.move_speed - 250.0).abs() < 1e-3);
    }

    #[test]
    fn projectile_damage_rounds_multiplied_base() {
        let config = RunConfig::default();
        let mut state = RunState::new(&config, &ResolvedLoadout::from_names("Rusty Sword", "Sprint"));
        state.damage_multiplier = 1.2;
        assert_eq!(state.projectile_damage(), 18);
    }
}
