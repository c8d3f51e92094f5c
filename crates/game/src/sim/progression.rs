use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use super::config::ProgressionConfig;
use super::context::RunContext;
use super::events::RunEvent;
use super::spawn::SpawnDirector;
use super::state::{RunPhase, RunState};

/// Temporary stat modifiers offered on level-up. They last for the run only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeKind {
    DamagePercent,
    MoveSpeed,
    HealFlat,
    ReloadTimePercent,
}

impl UpgradeKind {
    pub const CATALOG: [UpgradeKind; 4] = [
        UpgradeKind::DamagePercent,
        UpgradeKind::MoveSpeed,
        UpgradeKind::HealFlat,
        UpgradeKind::ReloadTimePercent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UpgradeKind::DamagePercent => "+Damage",
            UpgradeKind::MoveSpeed => "+Move Speed",
            UpgradeKind::HealFlat => "Heal",
            UpgradeKind::ReloadTimePercent => "-Reload Time",
        }
    }

    pub fn apply(self, state: &mut RunState, config: &ProgressionConfig) {
        match self {
            UpgradeKind::DamagePercent => {
                state.damage_multiplier += config.damage_bonus_percent as f32 / 100.0;
            }
            UpgradeKind::MoveSpeed => state.move_speed += config.speed_bonus,
            UpgradeKind::HealFlat => {
                state.heal(config.heal_amount);
            }
            UpgradeKind::ReloadTimePercent => {
                let keep = 100u32.saturating_sub(config.reload_reduction_percent);
                state.reload_time = state.reload_time * keep / 100;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub required_xp: u32,
}

/// Next XP threshold; applied one level at a time so flooring compounds.
pub fn next_required_xp(required_xp: u32, growth: f64) -> u32 {
    (required_xp as f64 * growth).floor() as u32
}

/// Up to `count` distinct catalog entries.
pub fn roll_upgrade_options(rng: &mut impl Rng, count: usize) -> Vec<UpgradeKind> {
    UpgradeKind::CATALOG
        .choose_multiple(rng, count)
        .copied()
        .collect()
}

/// XP, levels and the upgrade offer that pauses the run.
#[derive(Debug, Default)]
pub struct ProgressionTracker {
    pending_options: Vec<UpgradeKind>,
}

impl ProgressionTracker {
    pub fn pending_options(&self) -> &[UpgradeKind] {
        &self.pending_options
    }

    /// Grants XP; at most one level is gained per call and any surplus carries
    /// into the next level.
    pub fn add_xp(
        &mut self,
        ctx: &mut RunContext<'_>,
        spawner: &mut SpawnDirector,
        amount: u32,
    ) -> Option<LevelUp> {
        if !ctx.state.machine.is_active() {
            return None;
        }
        ctx.state.current_xp = ctx.state.current_xp.saturating_add(amount);
        if ctx.state.current_xp < ctx.state.required_xp {
            return None;
        }

        ctx.state.level += 1;
        ctx.state.current_xp -= ctx.state.required_xp;
        ctx.state.required_xp =
            next_required_xp(ctx.state.required_xp, ctx.config.progression.growth);
        let level_up = LevelUp {
            level: ctx.state.level,
            required_xp: ctx.state.required_xp,
        };
        info!(
            level = level_up.level,
            required_xp = level_up.required_xp,
            carried_xp = ctx.state.current_xp,
            "level_up"
        );
        ctx.emit(RunEvent::LeveledUp {
            level: level_up.level,
            required_xp: level_up.required_xp,
        });

        if level_up.level == ctx.config.portal.unlock_level {
            spawner.open_portal(ctx);
        }

        self.pending_options =
            roll_upgrade_options(ctx.rng, ctx.config.progression.upgrade_choices);
        ctx.state.machine.pause_for_upgrade();
        ctx.emit(RunEvent::UpgradeOffered {
            options: self.pending_options.clone(),
        });
        Some(level_up)
    }

    /// Applies the option at `index` and resumes the run. Ignored unless an
    /// offer is pending and the index is in range.
    pub fn choose_upgrade(
        &mut self,
        ctx: &mut RunContext<'_>,
        index: usize,
    ) -> Option<UpgradeKind> {
        if ctx.state.phase() != RunPhase::Paused {
            return None;
        }
        let upgrade = *self.pending_options.get(index)?;
        upgrade.apply(ctx.state, &ctx.config.progression);
        self.pending_options.clear();
        ctx.state.machine.resume();
        info!(upgrade = upgrade.label(), "upgrade_applied");
        ctx.emit(RunEvent::UpgradeApplied { upgrade });
        Some(upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::RunConfig;
    use crate::sim::loadout::ResolvedLoadout;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    #[test]
    fn required_xp_compounds_the_floor_each_level() {
        let mut required = 10;
        let mut sequence = Vec::new();
        for _ in 0..4 {
            required = next_required_xp(required, 1.5);
            sequence.push(required);
        }

        assert_eq!(sequence, vec![15, 22, 33, 49]);
        // A closed form would give floor(10 * 1.5^4) = 50.
        assert_ne!(required, (10.0 * 1.5f64.powi(4)).floor() as u32);
    }

    #[test]
    fn default_curve_from_one_hundred() {
        let mut required = 100;
        let mut sequence = Vec::new();
        for _ in 0..5 {
            required = next_required_xp(required, 1.5);
            sequence.push(required);
        }
        assert_eq!(sequence, vec![150, 225, 337, 505, 757]);
    }

    #[test]
    fn upgrade_options_are_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let options = roll_upgrade_options(&mut rng, 3);
            assert_eq!(options.len(), 3);
            for (i, option) in options.iter().enumerate() {
                assert!(!options[i + 1..].contains(option));
            }
        }
    }

    #[test]
    fn upgrades_adjust_run_state() {
        let config = RunConfig::default();
        let mut state =
            RunState::new(&config, &ResolvedLoadout::from_names("Rusty Sword", "Heal"));
        state.take_damage(10);

        UpgradeKind::DamagePercent.apply(&mut state, &config.progression);
        UpgradeKind::MoveSpeed.apply(&mut state, &config.progression);
        UpgradeKind::HealFlat.apply(&mut state, &config.progression);
        UpgradeKind::ReloadTimePercent.apply(&mut state, &config.progression);

        assert!((state.damage_multiplier - 1.2).abs() < 1e-6);
        assert!((state.move_speed - 280.0).abs() < 1e-3);
        assert_eq!(state.health, state.max_health);
        assert_eq!(state.reload_time, Duration::from_millis(1275));
    }
}
