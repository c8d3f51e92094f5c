use harvest_engine::PoolHandle;
use tracing::{debug, info};

use super::context::RunContext;
use super::events::RunEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionReceipt {
    pub gold: u32,
    pub shards: u32,
    pub meta_xp: u64,
    pub account_levels_gained: u32,
}

/// Moves currency between the run wallet and the persistent profile. Every
/// persisting operation flushes the profile exactly once.
#[derive(Debug, Default)]
pub struct EconomyLedger;

impl EconomyLedger {
    pub fn collect_gold(&self, ctx: &mut RunContext<'_>, value: u32) {
        ctx.state.temp_gold = ctx.state.temp_gold.saturating_add(value);
    }

    pub fn collect_shard(&self, ctx: &mut RunContext<'_>, value: u32) {
        ctx.state.collected_shards = ctx.state.collected_shards.saturating_add(value);
    }

    /// Hands the run's gold to a live courier. No-op without a live courier
    /// or with an empty wallet.
    pub fn bank(&self, ctx: &mut RunContext<'_>, courier: PoolHandle) -> Option<u32> {
        if !ctx.state.machine.is_active()
            || !ctx.world.couriers.is_live(courier)
            || ctx.state.temp_gold == 0
        {
            debug!(temp_gold = ctx.state.temp_gold, "bank_skipped");
            return None;
        }
        let amount = ctx.state.temp_gold;
        ctx.account.update("bank", |profile| {
            profile.total_gold = profile.total_gold.saturating_add(u64::from(amount));
        });
        ctx.state.temp_gold = 0;
        ctx.world.couriers.release(courier);
        info!(amount, "gold_banked");
        ctx.emit(RunEvent::GoldBanked { amount });
        ctx.emit(RunEvent::CourierLeft);
        Some(amount)
    }

    /// Ends the run through the open portal, merging the wallet and converting
    /// run levels into meta XP.
    pub fn extract(&self, ctx: &mut RunContext<'_>) -> Option<ExtractionReceipt> {
        if !ctx.state.machine.is_active() || !ctx.state.portal_active {
            return None;
        }
        let gold = ctx.state.temp_gold;
        let shards = ctx.state.collected_shards;
        let meta_xp = u64::from(ctx.state.level) * ctx.config.meta.xp_per_run_level;
        let level_step = ctx.config.meta.account_level_step;

        let account_levels_gained = ctx.account.update("extract", |profile| {
            profile.total_gold = profile.total_gold.saturating_add(u64::from(gold));
            profile.blood_shards = profile.blood_shards.saturating_add(u64::from(shards));
            profile.add_meta_xp(meta_xp, level_step)
        });
        ctx.state.temp_gold = 0;
        ctx.state.machine.extract();
        ctx.halt_timers();

        info!(gold, shards, meta_xp, account_levels_gained, "run_extracted");
        ctx.emit(RunEvent::RunExtracted {
            gold,
            shards,
            meta_xp,
        });
        Some(ExtractionReceipt {
            gold,
            shards,
            meta_xp,
            account_levels_gained,
        })
    }

    /// Keeps the shards of a lost run; its gold is forfeited. Only called
    /// right after the GameOver transition.
    pub fn on_death(&self, ctx: &mut RunContext<'_>) {
        let shards = ctx.state.collected_shards;
        let gold_lost = ctx.state.temp_gold;
        ctx.account.update("death", |profile| {
            profile.blood_shards = profile.blood_shards.saturating_add(u64::from(shards));
        });
        info!(shards_kept = shards, gold_lost, "run_lost");
        ctx.emit(RunEvent::PlayerDied {
            shards_kept: shards,
            gold_lost,
        });
    }
}
