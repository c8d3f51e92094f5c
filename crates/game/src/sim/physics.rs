use harvest_engine::{MoveAxes, PoolHandle, Vec2};

use super::combat::OverlapPair;
use super::config::RunConfig;
use super::entities::PickupKind;
use super::world::RunWorld;

/// Axis-aligned box centred on `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
}

impl Aabb {
    pub fn square(center: Vec2, size: f32) -> Self {
        Self::rect(center, size, size)
    }

    pub fn rect(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        (self.center.x - other.center.x).abs() < self.half_width + other.half_width
            && (self.center.y - other.center.y).abs() < self.half_height + other.half_height
    }
}

/// Diagonal input is normalized so it is no faster than straight input.
pub fn movement_delta(axes: MoveAxes, speed: f32, fixed_dt_seconds: f32) -> Vec2 {
    Vec2::new(f32::from(axes.x), f32::from(axes.y))
        .normalized_or_zero()
        .scaled(speed * fixed_dt_seconds)
}

pub fn step_toward(current: Vec2, target: Vec2, speed: f32, fixed_dt_seconds: f32) -> Vec2 {
    let offset = target - current;
    let distance = offset.length();
    let max_step = speed * fixed_dt_seconds;
    if max_step >= distance {
        return target;
    }
    current + offset.scaled(max_step / distance)
}

pub fn move_player(world: &mut RunWorld, config: &RunConfig, axes: MoveAxes, speed: f32, dt: f32) {
    let half = config.player.size / 2.0;
    let moved = world.player.position + movement_delta(axes, speed, dt);
    world.player.position = Vec2::new(
        moved.x.clamp(half, config.world.width - half),
        moved.y.clamp(half, config.world.height - half),
    );
}

pub fn advance_enemies(world: &mut RunWorld, dt: f32) {
    let player = world.player.position;
    world.enemies.for_each_active(|_, enemy| {
        enemy.position = step_toward(enemy.position, player, enemy.speed, dt);
    });
}

/// Homing shots re-aim at a live target each step; orphaned shots keep their
/// last heading. Shots leaving the world are released.
pub fn advance_projectiles(world: &mut RunWorld, config: &RunConfig, dt: f32) {
    let speed = config.projectile.speed;
    let mut escaped = Vec::new();
    for handle in world.projectiles.active_handles() {
        let target = world
            .projectiles
            .get(handle)
            .and_then(|shot| shot.target)
            .and_then(|target| world.enemies.get(target).map(|enemy| enemy.position));
        let Some(shot) = world.projectiles.get_mut(handle) else {
            continue;
        };
        match target {
            Some(target) => {
                let heading = (target - shot.position).normalized_or_zero();
                if heading != Vec2::ZERO {
                    shot.velocity = heading.scaled(speed);
                }
            }
            None => shot.target = None,
        }
        shot.position = shot.position + shot.velocity.scaled(dt);
        if !config.world.contains(shot.position) {
            escaped.push(handle);
        }
    }
    for handle in escaped {
        world.projectiles.release(handle);
    }
}

/// Every overlap of this tick, projectile hits first.
pub fn detect_overlaps(world: &RunWorld, config: &RunConfig) -> Vec<OverlapPair> {
    let mut pairs = Vec::new();
    let enemy_boxes: Vec<(PoolHandle, Aabb)> = world
        .enemies
        .iter_active()
        .map(|(handle, enemy)| (handle, Aabb::square(enemy.position, config.enemy.size)))
        .collect();

    for (projectile, shot) in world.projectiles.iter_active() {
        let shot_box = Aabb::square(shot.position, config.projectile.size);
        for (enemy, enemy_box) in &enemy_boxes {
            if shot_box.overlaps(enemy_box) {
                pairs.push(OverlapPair::ProjectileEnemy {
                    projectile,
                    enemy: *enemy,
                });
            }
        }
    }

    let player_box = Aabb::square(world.player.position, config.player.size);
    for (enemy, enemy_box) in &enemy_boxes {
        if player_box.overlaps(enemy_box) {
            pairs.push(OverlapPair::PlayerEnemy { enemy: *enemy });
        }
    }

    for kind in PickupKind::ALL {
        let size = match kind {
            PickupKind::XpOrb => config.loot.xp_orb_size,
            PickupKind::GoldCoin => config.loot.gold_coin_size,
            PickupKind::BloodShard => config.loot.blood_shard_size,
        };
        for (pickup, item) in world.pickups.pool(kind).iter_active() {
            if player_box.overlaps(&Aabb::square(item.position, size)) {
                pairs.push(OverlapPair::PlayerPickup { kind, pickup });
            }
        }
    }

    for (courier, body) in world.couriers.iter_active() {
        let courier_box = Aabb::rect(body.position, config.courier.width, config.courier.height);
        if player_box.overlaps(&courier_box) {
            pairs.push(OverlapPair::PlayerCourier { courier });
        }
    }

    for (portal, body) in world.portals.iter_active() {
        let portal_box = Aabb::rect(body.position, config.portal.width, config.portal.height);
        if player_box.overlaps(&portal_box) {
            pairs.push(OverlapPair::PlayerPortal { portal });
        }
    }

    pairs
}
