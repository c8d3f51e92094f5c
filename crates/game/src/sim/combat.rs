use harvest_engine::{EntityPool, PoolHandle, Vec2};
use rand::Rng;
use tracing::{debug, trace};

use super::config::LootConfig;
use super::context::RunContext;
use super::economy::EconomyLedger;
use super::entities::{Enemy, PickupKind};
use super::events::RunEvent;
use super::progression::ProgressionTracker;
use super::spawn::SpawnDirector;
use super::tasks::TaskKind;

/// Overlaps reported by whatever does collision detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPair {
    ProjectileEnemy {
        projectile: PoolHandle,
        enemy: PoolHandle,
    },
    PlayerEnemy {
        enemy: PoolHandle,
    },
    PlayerPickup {
        kind: PickupKind,
        pickup: PoolHandle,
    },
    PlayerCourier {
        courier: PoolHandle,
    },
    PlayerPortal {
        portal: PoolHandle,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LootRoll {
    pub gold: Option<u32>,
    pub shard: Option<u32>,
}

/// Gold and shard drops are independent trials, and independent of the XP
/// orb every death leaves behind.
pub fn roll_loot(rng: &mut impl Rng, loot: &LootConfig) -> LootRoll {
    let gold = rng
        .gen_bool(loot.gold_chance)
        .then(|| rng.gen_range(loot.gold_min..=loot.gold_max));
    let shard = rng.gen_bool(loot.shard_chance).then_some(loot.shard_value);
    LootRoll { gold, shard }
}

/// Linear scan with strict `<`, so the first enemy at the minimum distance
/// wins ties.
pub fn nearest_enemy(enemies: &EntityPool<Enemy>, from: Vec2) -> Option<PoolHandle> {
    let mut best: Option<(PoolHandle, f32)> = None;
    for (handle, enemy) in enemies.iter_active() {
        let distance = from.distance(enemy.position);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((handle, distance));
        }
    }
    best.map(|(handle, _)| handle)
}

/// Turns overlaps and weapon timers into damage, deaths and loot.
#[derive(Debug, Default)]
pub struct CombatResolver {
    ledger: EconomyLedger,
}

impl CombatResolver {
    pub fn resolve(
        &self,
        ctx: &mut RunContext<'_>,
        progression: &mut ProgressionTracker,
        spawner: &mut SpawnDirector,
        pair: OverlapPair,
    ) {
        if !ctx.state.machine.is_active() {
            return;
        }
        match pair {
            OverlapPair::ProjectileEnemy { projectile, enemy } => {
                self.projectile_hits_enemy(ctx, projectile, enemy)
            }
            OverlapPair::PlayerEnemy { enemy } => self.enemy_touches_player(ctx, enemy),
            OverlapPair::PlayerPickup { kind, pickup } => {
                self.collect_pickup(ctx, progression, spawner, kind, pickup)
            }
            OverlapPair::PlayerCourier { courier } => {
                self.ledger.bank(ctx, courier);
            }
            OverlapPair::PlayerPortal { portal } => {
                if ctx.world.portals.is_live(portal) {
                    self.ledger.extract(ctx);
                }
            }
        }
    }

    fn projectile_hits_enemy(
        &self,
        ctx: &mut RunContext<'_>,
        projectile: PoolHandle,
        enemy: PoolHandle,
    ) {
        if !ctx.world.enemies.is_live(enemy) {
            return;
        }
        let Some(damage) = ctx.world.projectiles.get(projectile).map(|shot| shot.damage) else {
            return;
        };
        ctx.world.projectiles.release(projectile);

        let Some(target) = ctx.world.enemies.get_mut(enemy) else {
            return;
        };
        let died = target.take_damage(damage);
        let remaining = target.health;
        let position = target.position;
        ctx.emit(RunEvent::EnemyDamaged {
            enemy,
            amount: damage,
            remaining,
        });
        if died && ctx.world.enemies.release(enemy) {
            self.enemy_died(ctx, position);
        }
    }

    fn enemy_died(&self, ctx: &mut RunContext<'_>, position: Vec2) {
        debug!(x = position.x, y = position.y, "enemy_killed");
        ctx.emit(RunEvent::EnemyKilled { position });

        let config = ctx.config;
        let loot = &config.loot;
        self.drop_pickup(ctx, PickupKind::XpOrb, position, loot.xp_value);
        let roll = roll_loot(ctx.rng, loot);
        if let Some(gold) = roll.gold {
            self.drop_pickup(ctx, PickupKind::GoldCoin, position, gold);
        }
        if let Some(shard) = roll.shard {
            self.drop_pickup(ctx, PickupKind::BloodShard, position, shard);
        }
    }

    fn drop_pickup(&self, ctx: &mut RunContext<'_>, kind: PickupKind, position: Vec2, value: u32) {
        if ctx.world.pickups.drop_at(kind, position, value).is_none() {
            trace!(kind = ?kind, "pickup_skipped_pool_exhausted");
            return;
        }
        ctx.emit(RunEvent::PickupDropped { kind, value });
    }

    fn enemy_touches_player(&self, ctx: &mut RunContext<'_>, enemy: PoolHandle) {
        if ctx.state.invulnerable || !ctx.world.enemies.release(enemy) {
            return;
        }
        let amount = ctx.config.player.contact_damage;
        let health = ctx.state.take_damage(amount);
        ctx.state.invulnerable = true;
        ctx.tasks
            .schedule_once(ctx.config.player.invulnerability(), TaskKind::InvulnerabilityEnd);
        debug!(amount, health, "player_damaged");
        ctx.emit(RunEvent::PlayerDamaged { amount, health });

        if health == 0 && ctx.state.machine.game_over() {
            ctx.halt_timers();
            self.ledger.on_death(ctx);
        }
    }

    fn collect_pickup(
        &self,
        ctx: &mut RunContext<'_>,
        progression: &mut ProgressionTracker,
        spawner: &mut SpawnDirector,
        kind: PickupKind,
        pickup: PoolHandle,
    ) {
        let pool = ctx.world.pickups.pool_mut(kind);
        let Some(value) = pool.get(pickup).map(|item| item.value) else {
            return;
        };
        pool.release(pickup);
        ctx.emit(RunEvent::PickupCollected { kind, value });
        match kind {
            PickupKind::XpOrb => {
                progression.add_xp(ctx, spawner, value);
            }
            PickupKind::GoldCoin => self.ledger.collect_gold(ctx, value),
            PickupKind::BloodShard => self.ledger.collect_shard(ctx, value),
        }
    }

    /// Fires one projectile at the nearest enemy when the weapon is ready.
    pub fn auto_fire(&self, ctx: &mut RunContext<'_>) -> Option<PoolHandle> {
        if !ctx.state.machine.is_active() || ctx.state.reloading || ctx.state.ammo == 0 {
            return None;
        }
        let origin = ctx.world.player.position;
        let target = nearest_enemy(&ctx.world.enemies, origin)?;
        let target_position = ctx.world.enemies.get(target)?.position;
        let Some(projectile) = ctx.world.projectiles.acquire(origin) else {
            trace!("projectile_skipped_pool_exhausted");
            return None;
        };
        let velocity = (target_position - origin)
            .normalized_or_zero()
            .scaled(ctx.config.projectile.speed);
        let damage = ctx.state.projectile_damage();
        if let Some(shot) = ctx.world.projectiles.get_mut(projectile) {
            shot.launch(damage, velocity, Some(target));
        }
        ctx.emit(RunEvent::ProjectileFired { projectile, target });

        ctx.state.ammo -= 1;
        if ctx.state.ammo == 0 {
            ctx.state.reloading = true;
            ctx.tasks
                .schedule_once(ctx.state.reload_time, TaskKind::ReloadComplete);
            debug!(reload_ms = ctx.state.reload_time.as_millis() as u64, "reload_started");
            ctx.emit(RunEvent::ReloadStarted);
        }
        Some(projectile)
    }

    pub fn finish_reload(&self, ctx: &mut RunContext<'_>) {
        if ctx.state.machine.is_terminal() || !ctx.state.reloading {
            return;
        }
        ctx.state.ammo = ctx.state.max_ammo;
        ctx.state.reloading = false;
        debug!(ammo = ctx.state.ammo, "reload_finished");
        ctx.emit(RunEvent::ReloadFinished);
    }

    pub fn end_invulnerability(&self, ctx: &mut RunContext<'_>) {
        if ctx.state.machine.is_terminal() {
            return;
        }
        ctx.state.invulnerable = false;
    }
}
