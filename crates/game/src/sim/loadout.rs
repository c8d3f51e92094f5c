use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponSpec {
    pub name: &'static str,
    pub damage: u32,
    pub fire_interval_ms: u64,
    pub magazine: u32,
    pub reload_ms: u64,
}

impl WeaponSpec {
    pub fn fire_interval(&self) -> Duration {
        Duration::from_millis(self.fire_interval_ms)
    }

    pub fn reload_time(&self) -> Duration {
        Duration::from_millis(self.reload_ms)
    }
}

pub const WEAPON_CATALOG: [WeaponSpec; 2] = [
    WeaponSpec {
        name: "Rusty Sword",
        damage: 15,
        fire_interval_ms: 800,
        magazine: 12,
        reload_ms: 1500,
    },
    WeaponSpec {
        name: "Hunting Crossbow",
        damage: 25,
        fire_interval_ms: 1200,
        magazine: 6,
        reload_ms: 2000,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    /// Scales player move speed.
    Sprint,
    /// Restores a little health on a fixed cadence.
    Heal,
}

impl Ability {
    pub const CATALOG: [Ability; 2] = [Ability::Sprint, Ability::Heal];

    pub fn name(self) -> &'static str {
        match self {
            Ability::Sprint => "Sprint",
            Ability::Heal => "Heal",
        }
    }

    pub fn from_name(name: &str) -> Option<Ability> {
        Self::CATALOG
            .into_iter()
            .find(|ability| ability.name() == name)
    }
}

pub fn weapon_by_name(name: &str) -> Option<WeaponSpec> {
    WEAPON_CATALOG.into_iter().find(|weapon| weapon.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLoadout {
    pub weapon: WeaponSpec,
    pub ability: Ability,
}

impl ResolvedLoadout {
    /// Names outside the catalog resolve to the first catalog entry.
    pub fn from_names(weapon: &str, ability: &str) -> Self {
        Self {
            weapon: weapon_by_name(weapon).unwrap_or(WEAPON_CATALOG[0]),
            ability: Ability::from_name(ability).unwrap_or(Ability::CATALOG[0]),
        }
    }
}
