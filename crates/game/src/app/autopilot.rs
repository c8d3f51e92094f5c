use harvest_engine::{InputAction, InputSnapshot, Vec2};

use crate::sim::combat::nearest_enemy;
use crate::sim::{PickupKind, RunPhase, RunSimulation};

const ARRIVAL_DEADZONE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Intent {
    Toward(Vec2),
    AwayFrom(Vec2),
    Hold,
}

/// Stand-in player for headless runs. Picks upgrade 0, walks into the
/// portal or a courier when that pays off, otherwise keeps its distance from
/// enemies and gathers loot.
#[derive(Debug, Clone)]
pub struct Autopilot {
    pub danger_radius: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            danger_radius: 160.0,
        }
    }
}

impl Autopilot {
    pub fn steer(&self, run: &RunSimulation) -> InputSnapshot {
        if run.phase() == RunPhase::Paused {
            return InputSnapshot::empty().with_upgrade_choice(Some(0));
        }
        let player = run.world().player.position;
        match self.choose_intent(run, player) {
            Intent::Toward(target) => axes_input(target - player),
            Intent::AwayFrom(threat) => axes_input(player - threat),
            Intent::Hold => InputSnapshot::empty(),
        }
    }

    fn choose_intent(&self, run: &RunSimulation, player: Vec2) -> Intent {
        let world = run.world();
        if run.state().portal_active {
            if let Some((_, portal)) = world.active_portal() {
                return Intent::Toward(portal);
            }
        }
        if run.state().temp_gold > 0 {
            if let Some((_, courier)) = world.active_courier() {
                return Intent::Toward(courier);
            }
        }

        let threat = nearest_enemy(&world.enemies, player)
            .and_then(|handle| world.enemies.get(handle))
            .map(|enemy| enemy.position)
            .filter(|position| position.distance(player) < self.danger_radius);
        if let Some(threat) = threat {
            return Intent::AwayFrom(threat);
        }

        PickupKind::ALL
            .into_iter()
            .flat_map(|kind| world.pickups.pool(kind).iter_active())
            .map(|(_, pickup)| pickup.position)
            .min_by(|a, b| a.distance(player).total_cmp(&b.distance(player)))
            .map_or(Intent::Hold, Intent::Toward)
    }
}

fn axes_input(direction: Vec2) -> InputSnapshot {
    InputSnapshot::empty()
        .with_action_down(InputAction::MoveRight, direction.x > ARRIVAL_DEADZONE)
        .with_action_down(InputAction::MoveLeft, direction.x < -ARRIVAL_DEADZONE)
        .with_action_down(InputAction::MoveDown, direction.y > ARRIVAL_DEADZONE)
        .with_action_down(InputAction::MoveUp, direction.y < -ARRIVAL_DEADZONE)
}
