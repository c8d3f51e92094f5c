use std::time::Duration;

use harvest_engine::{InputSnapshot, Scene, SceneCommand};
use tracing::{debug, info};

use super::autopilot::Autopilot;
use crate::sim::{RunPhase, RunSimulation};

/// Hosts one run inside the engine loop. Idle input is handed to the
/// autopilot when one is attached.
pub struct HarvestScene {
    run: RunSimulation,
    autopilot: Option<Autopilot>,
    last_phase: RunPhase,
}

impl HarvestScene {
    pub fn new(run: RunSimulation, autopilot: Option<Autopilot>) -> Self {
        let last_phase = run.phase();
        Self {
            run,
            autopilot,
            last_phase,
        }
    }

    pub fn run(&self) -> &RunSimulation {
        &self.run
    }

    fn effective_input(&self, input: &InputSnapshot) -> InputSnapshot {
        match &self.autopilot {
            Some(pilot) if input.move_axes().is_idle() && input.upgrade_choice().is_none() => {
                pilot.steer(&self.run)
            }
            _ => *input,
        }
    }

    fn log_tick(&mut self) {
        let counts = self.run.last_tick_counts();
        if counts.total > 0 {
            debug!(
                total = counts.total,
                spawned = counts.enemies_spawned,
                fired = counts.projectiles_fired,
                killed = counts.enemies_killed,
                collected = counts.pickups_collected,
                "tick_events"
            );
        }
        let phase = self.run.phase();
        if phase != self.last_phase {
            info!(
                from = ?self.last_phase,
                to = ?phase,
                elapsed_ms = self.run.elapsed().as_millis() as u64,
                "run_phase_changed"
            );
            self.last_phase = phase;
        }
    }
}

impl Scene for HarvestScene {
    fn load(&mut self) {
        let loadout = self.run.loadout();
        info!(
            weapon = loadout.weapon.name,
            ability = loadout.ability.name(),
            autopilot = self.autopilot.is_some(),
            "scene_loaded"
        );
    }

    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> SceneCommand {
        let input = self.effective_input(input);
        self.run.tick(fixed_dt, &input);
        self.log_tick();
        if self.run.phase().is_terminal() {
            SceneCommand::Finish
        } else {
            SceneCommand::None
        }
    }

    fn unload(&mut self) {
        let hud = self.run.hud();
        info!(
            phase = ?hud.phase,
            banner = ?hud.banner(),
            level = hud.level,
            temp_gold = hud.temp_gold,
            shards = hud.shards,
            health_pct = (hud.health_fraction * 100.0).round() as u32,
            elapsed_ms = self.run.elapsed().as_millis() as u64,
            "scene_unloaded"
        );
    }

    fn debug_title(&self) -> Option<String> {
        let hud = self.run.hud();
        Some(format!(
            "Soul Harvest | {:?} | lvl {} ({:.0}% xp) | hp {:.0}% | ammo {}/{}{} | gold {} | shards {}",
            hud.phase,
            hud.level,
            hud.xp_fraction * 100.0,
            hud.health_fraction * 100.0,
            hud.ammo,
            hud.max_ammo,
            if hud.reloading { " reloading" } else { "" },
            hud.temp_gold,
            hud.shards,
        ))
    }
}
