use std::f32::consts::TAU;

use harvest_engine::{PoolHandle, Vec2};
use rand::Rng;
use tracing::{debug, info, trace};

use super::config::{CourierConfig, EnemyConfig, PortalConfig, WorldConfig};
use super::context::RunContext;
use super::entities::{Courier, Enemy, Portal};
use super::events::RunEvent;
use super::tasks::TaskKind;

/// Decides when and where enemies, couriers and the portal appear. Every
/// policy is inert outside the Active phase.
#[derive(Debug, Default)]
pub struct SpawnDirector {
    portal_opened: bool,
}

impl SpawnDirector {
    pub fn portal_opened(&self) -> bool {
        self.portal_opened
    }

    pub fn spawn_enemy(&self, ctx: &mut RunContext<'_>) -> Option<PoolHandle> {
        if !ctx.state.machine.is_active() {
            return None;
        }
        let position = enemy_spawn_position(&ctx.config.world, &ctx.config.enemy, ctx.rng);
        let Some(handle) = ctx.world.enemies.acquire(position) else {
            trace!(kind = ?Enemy::KIND, "spawn_skipped_pool_exhausted");
            return None;
        };
        if let Some(enemy) = ctx.world.enemies.get_mut(handle) {
            enemy.arm(ctx.config.enemy.max_health, ctx.config.enemy.speed);
        }
        trace!(x = position.x, y = position.y, "enemy_spawned");
        ctx.emit(RunEvent::EnemySpawned {
            enemy: handle,
            position,
        });
        Some(handle)
    }

    /// One courier roll. The Bernoulli trial is only drawn when no courier is
    /// already waiting.
    pub fn roll_courier(&self, ctx: &mut RunContext<'_>) -> Option<PoolHandle> {
        if !ctx.state.machine.is_active() || ctx.world.couriers.active_count() > 0 {
            return None;
        }
        if !ctx.rng.gen_bool(ctx.config.courier.spawn_chance) {
            debug!("courier_roll_missed");
            return None;
        }
        let position =
            courier_spawn_position(ctx.world.player.position, &ctx.config.courier, ctx.rng);
        let Some(handle) = ctx.world.couriers.acquire(position) else {
            trace!(kind = ?Courier::KIND, "spawn_skipped_pool_exhausted");
            return None;
        };
        ctx.tasks.schedule_once(
            ctx.config.courier.lifespan(),
            TaskKind::CourierDespawn { courier: handle },
        );
        info!(x = position.x, y = position.y, "courier_arrived");
        ctx.emit(RunEvent::CourierArrived { position });
        Some(handle)
    }

    /// Opens the portal the first time it is asked; later calls are no-ops.
    pub fn open_portal(&mut self, ctx: &mut RunContext<'_>) -> bool {
        if self.portal_opened || !ctx.state.machine.is_active() {
            return false;
        }
        let position = portal_position(&ctx.config.world, &ctx.config.portal, ctx.rng);
        if ctx.world.portals.acquire(position).is_none() {
            trace!(kind = ?Portal::KIND, "spawn_skipped_pool_exhausted");
            return false;
        }
        self.portal_opened = true;
        ctx.state.portal_active = true;
        info!(x = position.x, y = position.y, "portal_opened");
        ctx.emit(RunEvent::PortalOpened { position });
        true
    }

    /// Removes a courier whose lifespan ran out. Stale handles are ignored.
    pub fn despawn_courier(&self, ctx: &mut RunContext<'_>, courier: PoolHandle) -> bool {
        if !ctx.state.machine.is_active() || !ctx.world.couriers.release(courier) {
            return false;
        }
        info!("courier_left");
        ctx.emit(RunEvent::CourierLeft);
        true
    }
}

/// Just outside the left or right edge at a uniform height.
pub fn enemy_spawn_position(
    world: &WorldConfig,
    enemy: &EnemyConfig,
    rng: &mut impl Rng,
) -> Vec2 {
    let x = if rng.gen_bool(0.5) {
        -enemy.spawn_margin
    } else {
        world.width + enemy.spawn_margin
    };
    let y = rng.gen_range(0.0..=world.height);
    Vec2::new(x, y)
}

pub fn courier_spawn_position(player: Vec2, courier: &CourierConfig, rng: &mut impl Rng) -> Vec2 {
    let angle = rng.gen_range(0.0..TAU);
    player + Vec2::from_angle(angle, courier.spawn_radius)
}

pub fn portal_position(world: &WorldConfig, portal: &PortalConfig, rng: &mut impl Rng) -> Vec2 {
    let x = rng.gen_range(portal.inset..=world.width - portal.inset);
    let y = rng.gen_range(portal.inset..=world.height - portal.inset);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn enemy_spawns_sit_beyond_a_side_edge() {
        let world = WorldConfig::default();
        let enemy = EnemyConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..200 {
            let position = enemy_spawn_position(&world, &enemy, &mut rng);
            assert!(position.x == -50.0 || position.x == 1330.0, "{position:?}");
            assert!((0.0..=720.0).contains(&position.y));
        }
    }

    #[test]
    fn courier_spawns_on_the_radius_around_the_player() {
        let courier = CourierConfig::default();
        let player = Vec2::new(640.0, 360.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for _ in 0..50 {
            let position = courier_spawn_position(player, &courier, &mut rng);
            assert!((position.distance(player) - 300.0).abs() < 1e-2);
        }
    }

    #[test]
    fn portal_stays_inside_the_inset() {
        let world = WorldConfig::default();
        let portal = PortalConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..200 {
            let position = portal_position(&world, &portal, &mut rng);
            assert!((100.0..=1180.0).contains(&position.x));
            assert!((100.0..=620.0).contains(&position.y));
        }
    }
}
