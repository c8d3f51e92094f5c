use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_engine::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config json: {0}")]
    Parse(String),
    #[error("validation failed at {path}: {message}")]
    Invalid { path: &'static str, message: String },
}

/// Every tuning constant of a run. Sections missing from a config file fall
/// back to their defaults field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub projectile: ProjectileConfig,
    pub loot: LootConfig,
    pub courier: CourierConfig,
    pub portal: PortalConfig,
    pub progression: ProgressionConfig,
    pub meta: MetaConfig,
    pub heal: PassiveHealConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl WorldConfig {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.x <= self.width
            && position.y >= 0.0
            && position.y <= self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub size: f32,
    pub max_health: u32,
    pub move_speed: f32,
    pub contact_damage: u32,
    pub invulnerability_ms: u64,
    pub sprint_multiplier: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: 40.0,
            max_health: 100,
            move_speed: 250.0,
            contact_damage: 10,
            invulnerability_ms: 1000,
            sprint_multiplier: 1.25,
        }
    }
}

impl PlayerConfig {
    pub fn invulnerability(&self) -> Duration {
        Duration::from_millis(self.invulnerability_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnemyConfig {
    pub pool_size: usize,
    pub size: f32,
    pub speed: f32,
    pub max_health: u32,
    pub spawn_interval_ms: u64,
    /// Distance beyond the left/right world edge where waves appear.
    pub spawn_margin: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            pool_size: 50,
            size: 30.0,
            speed: 80.0,
            max_health: 30,
            spawn_interval_ms: 1000,
            spawn_margin: 50.0,
        }
    }
}

impl EnemyConfig {
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectileConfig {
    pub pool_size: usize,
    pub size: f32,
    pub speed: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            pool_size: 30,
            size: 10.0,
            speed: 400.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LootConfig {
    pub xp_orb_pool: usize,
    pub gold_coin_pool: usize,
    pub blood_shard_pool: usize,
    pub xp_value: u32,
    pub gold_chance: f64,
    pub gold_min: u32,
    pub gold_max: u32,
    pub shard_chance: f64,
    pub shard_value: u32,
    pub xp_orb_size: f32,
    pub gold_coin_size: f32,
    pub blood_shard_size: f32,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            xp_orb_pool: 100,
            gold_coin_pool: 60,
            blood_shard_pool: 20,
            xp_value: 10,
            gold_chance: 0.30,
            gold_min: 5,
            gold_max: 15,
            shard_chance: 0.05,
            shard_value: 1,
            xp_orb_size: 15.0,
            gold_coin_size: 12.0,
            blood_shard_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CourierConfig {
    pub roll_interval_ms: u64,
    pub spawn_chance: f64,
    pub spawn_radius: f32,
    pub lifespan_ms: u64,
    pub width: f32,
    pub height: f32,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            roll_interval_ms: 60_000,
            spawn_chance: 0.4,
            spawn_radius: 300.0,
            lifespan_ms: 30_000,
            width: 40.0,
            height: 60.0,
        }
    }
}

impl CourierConfig {
    pub fn roll_interval(&self) -> Duration {
        Duration::from_millis(self.roll_interval_ms)
    }

    pub fn lifespan(&self) -> Duration {
        Duration::from_millis(self.lifespan_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    pub unlock_level: u32,
    pub inset: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            unlock_level: 3,
            inset: 100.0,
            width: 50.0,
            height: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressionConfig {
    pub initial_required_xp: u32,
    pub growth: f64,
    pub upgrade_choices: usize,
    pub damage_bonus_percent: u32,
    pub speed_bonus: f32,
    pub heal_amount: u32,
    pub reload_reduction_percent: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            initial_required_xp: 100,
            growth: 1.5,
            upgrade_choices: 3,
            damage_bonus_percent: 20,
            speed_bonus: 30.0,
            heal_amount: 25,
            reload_reduction_percent: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetaConfig {
    pub xp_per_run_level: u64,
    pub account_level_step: u64,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            xp_per_run_level: 100,
            account_level_step: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PassiveHealConfig {
    pub interval_ms: u64,
    pub amount: u32,
}

impl Default for PassiveHealConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            amount: 2,
        }
    }
}

impl PassiveHealConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: RunConfig = match serde_path_to_error::deserialize(&mut deserializer) {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                return Err(if path.is_empty() || path == "." {
                    ConfigError::Parse(source.to_string())
                } else {
                    ConfigError::Parse(format!("at {path}: {source}"))
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(path: &'static str, message: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                path,
                message: message.into(),
            }
        }

        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            return Err(invalid("world", "width and height must be positive"));
        }
        if self.player.max_health == 0 {
            return Err(invalid("player.max_health", "must be at least 1"));
        }
        if self.enemy.max_health == 0 {
            return Err(invalid("enemy.max_health", "must be at least 1"));
        }
        for (path, chance) in [
            ("loot.gold_chance", self.loot.gold_chance),
            ("loot.shard_chance", self.loot.shard_chance),
            ("courier.spawn_chance", self.courier.spawn_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(path, format!("expected 0..=1, got {chance}")));
            }
        }
        if self.loot.gold_min > self.loot.gold_max {
            return Err(invalid(
                "loot.gold_min",
                format!(
                    "expected <= gold_max {}, got {}",
                    self.loot.gold_max, self.loot.gold_min
                ),
            ));
        }
        if self.progression.initial_required_xp == 0 {
            return Err(invalid("progression.initial_required_xp", "must be at least 1"));
        }
        if !(self.progression.growth >= 1.0) {
            return Err(invalid("progression.growth", "must be at least 1.0"));
        }
        if self.progression.reload_reduction_percent >= 100 {
            return Err(invalid(
                "progression.reload_reduction_percent",
                "must be below 100",
            ));
        }
        if self.meta.account_level_step == 0 {
            return Err(invalid("meta.account_level_step", "must be at least 1"));
        }
        let portal_fits = self.portal.inset * 2.0 < self.world.width
            && self.portal.inset * 2.0 < self.world.height;
        if !portal_fits {
            return Err(invalid("portal.inset", "inset leaves no room inside the world"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config =
            RunConfig::from_json_str(r#"{ "enemy": { "pool_size": 5 } }"#).expect("config");

        assert_eq!(config.enemy.pool_size, 5);
        assert_eq!(config.enemy.speed, EnemyConfig::default().speed);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn parse_error_reports_json_path() {
        let error = RunConfig::from_json_str(r#"{ "loot": { "gold_chance": "high" } }"#)
            .expect_err("type mismatch");

        let message = error.to_string();
        assert!(message.contains("loot.gold_chance"), "{message}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = RunConfig::from_json_str(r#"{ "enemy": { "armour": 3 } }"#)
            .expect_err("unknown field");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_out_of_range_chance() {
        let error = RunConfig::from_json_str(r#"{ "courier": { "spawn_chance": 1.5 } }"#)
            .expect_err("chance out of range");

        assert!(matches!(
            error,
            ConfigError::Invalid {
                path: "courier.spawn_chance",
                ..
            }
        ));
    }

    #[test]
    fn default_config_is_valid() {
        RunConfig::default().validate().expect("defaults validate");
    }
}
