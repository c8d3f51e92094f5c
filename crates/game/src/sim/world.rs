use harvest_engine::{EntityPool, PoolHandle, Vec2};

use super::config::RunConfig;
use super::entities::{Courier, Enemy, Pickup, PickupKind, Portal, Projectile};

pub(crate) const COURIER_POOL_SIZE: usize = 1;
pub(crate) const PORTAL_POOL_SIZE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub position: Vec2,
}

#[derive(Debug)]
pub struct PickupPools {
    pub xp_orbs: EntityPool<Pickup>,
    pub gold_coins: EntityPool<Pickup>,
    pub blood_shards: EntityPool<Pickup>,
}

impl PickupPools {
    pub fn pool(&self, kind: PickupKind) -> &EntityPool<Pickup> {
        match kind {
            PickupKind::XpOrb => &self.xp_orbs,
            PickupKind::GoldCoin => &self.gold_coins,
            PickupKind::BloodShard => &self.blood_shards,
        }
    }

    pub fn pool_mut(&mut self, kind: PickupKind) -> &mut EntityPool<Pickup> {
        match kind {
            PickupKind::XpOrb => &mut self.xp_orbs,
            PickupKind::GoldCoin => &mut self.gold_coins,
            PickupKind::BloodShard => &mut self.blood_shards,
        }
    }

    /// Activates a pickup of `kind`; `None` when that pool is exhausted.
    pub fn drop_at(&mut self, kind: PickupKind, position: Vec2, value: u32) -> Option<PoolHandle> {
        let pool = self.pool_mut(kind);
        let handle = pool.acquire(position)?;
        if let Some(pickup) = pool.get_mut(handle) {
            pickup.value = value;
        }
        Some(handle)
    }
}

/// Every pooled entity of a run plus the player body.
#[derive(Debug)]
pub struct RunWorld {
    pub player: Player,
    pub enemies: EntityPool<Enemy>,
    pub projectiles: EntityPool<Projectile>,
    pub pickups: PickupPools,
    pub couriers: EntityPool<Courier>,
    pub portals: EntityPool<Portal>,
}

impl RunWorld {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            player: Player {
                position: config.world.center(),
            },
            enemies: EntityPool::new(config.enemy.pool_size),
            projectiles: EntityPool::new(config.projectile.pool_size),
            pickups: PickupPools {
                xp_orbs: EntityPool::new(config.loot.xp_orb_pool),
                gold_coins: EntityPool::new(config.loot.gold_coin_pool),
                blood_shards: EntityPool::new(config.loot.blood_shard_pool),
            },
            couriers: EntityPool::new(COURIER_POOL_SIZE),
            portals: EntityPool::new(PORTAL_POOL_SIZE),
        }
    }

    pub fn active_courier(&self) -> Option<(PoolHandle, Vec2)> {
        self.couriers
            .iter_active()
            .next()
            .map(|(handle, courier)| (handle, courier.position))
    }

    pub fn active_portal(&self) -> Option<(PoolHandle, Vec2)> {
        self.portals
            .iter_active()
            .next()
            .map(|(handle, portal)| (handle, portal.position))
    }
}
