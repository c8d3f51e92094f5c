use super::progression::UpgradeKind;
use super::state::{RunPhase, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    GameOver,
    Extracted,
}

/// Read-only view for whatever draws the HUD.
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub health_fraction: f32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub reloading: bool,
    pub xp_fraction: f32,
    pub level: u32,
    pub temp_gold: u32,
    pub shards: u32,
    pub phase: RunPhase,
    pub portal_active: bool,
    pub upgrade_options: Vec<&'static str>,
}

impl HudSnapshot {
    pub fn capture(state: &RunState, pending_upgrades: &[UpgradeKind]) -> Self {
        Self {
            health_fraction: state.health_fraction(),
            ammo: state.ammo,
            max_ammo: state.max_ammo,
            reloading: state.reloading,
            xp_fraction: state.xp_fraction(),
            level: state.level,
            temp_gold: state.temp_gold,
            shards: state.collected_shards,
            phase: state.phase(),
            portal_active: state.portal_active,
            upgrade_options: pending_upgrades.iter().map(|upgrade| upgrade.label()).collect(),
        }
    }

    pub fn banner(&self) -> Option<Banner> {
        match self.phase {
            RunPhase::GameOver => Some(Banner::GameOver),
            RunPhase::Extracted => Some(Banner::Extracted),
            RunPhase::Active | RunPhase::Paused => None,
        }
    }
}
