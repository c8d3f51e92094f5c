use harvest_engine::{ActivatableEntity, PoolHandle, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Enemy,
    Projectile,
    Pickup,
    Courier,
    Portal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickupKind {
    XpOrb,
    GoldCoin,
    BloodShard,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [
        PickupKind::XpOrb,
        PickupKind::GoldCoin,
        PickupKind::BloodShard,
    ];
}

#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub position: Vec2,
    pub active: bool,
    pub health: u32,
    pub speed: f32,
}

impl Enemy {
    pub const KIND: EntityKind = EntityKind::Enemy;

    pub fn arm(&mut self, max_health: u32, speed: f32) {
        self.health = max_health;
        self.speed = speed;
    }

    /// Returns true when this hit took the enemy from alive to dead.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.health > 0;
        self.health = self.health.saturating_sub(amount);
        was_alive && self.health == 0
    }
}

impl ActivatableEntity for Enemy {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, position: Vec2) {
        *self = Enemy {
            position,
            active: true,
            ..Enemy::default()
        };
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Projectile {
    pub position: Vec2,
    pub active: bool,
    pub damage: u32,
    pub velocity: Vec2,
    /// Steered towards while the handle stays live.
    pub target: Option<PoolHandle>,
}

impl Projectile {
    pub const KIND: EntityKind = EntityKind::Projectile;

    pub fn launch(&mut self, damage: u32, velocity: Vec2, target: Option<PoolHandle>) {
        self.damage = damage;
        self.velocity = velocity;
        self.target = target;
    }
}

impl ActivatableEntity for Projectile {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, position: Vec2) {
        *self = Projectile {
            position,
            active: true,
            ..Projectile::default()
        };
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.target = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pickup {
    pub position: Vec2,
    pub active: bool,
    pub value: u32,
}

impl Pickup {
    pub const KIND: EntityKind = EntityKind::Pickup;
}

impl ActivatableEntity for Pickup {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, position: Vec2) {
        self.position = position;
        self.active = true;
        self.value = 0;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Courier {
    pub position: Vec2,
    pub active: bool,
}

impl Courier {
    pub const KIND: EntityKind = EntityKind::Courier;
}

impl ActivatableEntity for Courier {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, position: Vec2) {
        self.position = position;
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Portal {
    pub position: Vec2,
    pub active: bool,
}

impl Portal {
    pub const KIND: EntityKind = EntityKind::Portal;
}

impl ActivatableEntity for Portal {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, position: Vec2) {
        self.position = position;
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_death_is_reported_once() {
        let mut enemy = Enemy::default();
        enemy.activate(Vec2::ZERO);
        enemy.arm(30, 80.0);

        assert!(!enemy.take_damage(15));
        assert!(enemy.take_damage(20));
        assert!(!enemy.take_damage(20));
        assert_eq!(enemy.health, 0);
    }

    #[test]
    fn reactivated_projectile_drops_previous_target() {
        let mut projectile = Projectile::default();
        projectile.activate(Vec2::ZERO);
        projectile.launch(15, Vec2::new(400.0, 0.0), None);
        projectile.deactivate();
        projectile.activate(Vec2::new(3.0, 4.0));

        assert_eq!(projectile.damage, 0);
        assert_eq!(projectile.velocity, Vec2::ZERO);
        assert!(projectile.target.is_none());
    }
}
