use harvest_engine::{PoolHandle, Vec2};

use super::entities::PickupKind;
use super::progression::UpgradeKind;

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    EnemySpawned {
        enemy: PoolHandle,
        position: Vec2,
    },
    ProjectileFired {
        projectile: PoolHandle,
        target: PoolHandle,
    },
    EnemyDamaged {
        enemy: PoolHandle,
        amount: u32,
        remaining: u32,
    },
    EnemyKilled {
        position: Vec2,
    },
    PickupDropped {
        kind: PickupKind,
        value: u32,
    },
    PickupCollected {
        kind: PickupKind,
        value: u32,
    },
    PlayerDamaged {
        amount: u32,
        health: u32,
    },
    PlayerHealed {
        amount: u32,
    },
    ReloadStarted,
    ReloadFinished,
    LeveledUp {
        level: u32,
        required_xp: u32,
    },
    UpgradeOffered {
        options: Vec<UpgradeKind>,
    },
    UpgradeApplied {
        upgrade: UpgradeKind,
    },
    PortalOpened {
        position: Vec2,
    },
    CourierArrived {
        position: Vec2,
    },
    CourierLeft,
    GoldBanked {
        amount: u32,
    },
    PlayerDied {
        shards_kept: u32,
        gold_lost: u32,
    },
    RunExtracted {
        gold: u32,
        shards: u32,
        meta_xp: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEventKind {
    EnemySpawned,
    ProjectileFired,
    EnemyDamaged,
    EnemyKilled,
    PickupDropped,
    PickupCollected,
    PlayerDamaged,
    PlayerHealed,
    Reload,
    Progression,
    Portal,
    Courier,
    Banked,
    RunEnded,
}

impl RunEvent {
    pub fn kind(&self) -> RunEventKind {
        match self {
            Self::EnemySpawned { .. } => RunEventKind::EnemySpawned,
            Self::ProjectileFired { .. } => RunEventKind::ProjectileFired,
            Self::EnemyDamaged { .. } => RunEventKind::EnemyDamaged,
            Self::EnemyKilled { .. } => RunEventKind::EnemyKilled,
            Self::PickupDropped { .. } => RunEventKind::PickupDropped,
            Self::PickupCollected { .. } => RunEventKind::PickupCollected,
            Self::PlayerDamaged { .. } => RunEventKind::PlayerDamaged,
            Self::PlayerHealed { .. } => RunEventKind::PlayerHealed,
            Self::ReloadStarted | Self::ReloadFinished => RunEventKind::Reload,
            Self::LeveledUp { .. } | Self::UpgradeOffered { .. } | Self::UpgradeApplied { .. } => {
                RunEventKind::Progression
            }
            Self::PortalOpened { .. } => RunEventKind::Portal,
            Self::CourierArrived { .. } | Self::CourierLeft => RunEventKind::Courier,
            Self::GoldBanked { .. } => RunEventKind::Banked,
            Self::PlayerDied { .. } | Self::RunExtracted { .. } => RunEventKind::RunEnded,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunEventCounts {
    pub total: u32,
    pub enemies_spawned: u32,
    pub projectiles_fired: u32,
    pub enemies_damaged: u32,
    pub enemies_killed: u32,
    pub pickups_dropped: u32,
    pub pickups_collected: u32,
    pub player_damaged: u32,
    pub player_healed: u32,
    pub reload: u32,
    pub progression: u32,
    pub portal: u32,
    pub courier: u32,
    pub banked: u32,
    pub run_ended: u32,
}

impl RunEventCounts {
    fn record(&mut self, kind: RunEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            RunEventKind::EnemySpawned => &mut self.enemies_spawned,
            RunEventKind::ProjectileFired => &mut self.projectiles_fired,
            RunEventKind::EnemyDamaged => &mut self.enemies_damaged,
            RunEventKind::EnemyKilled => &mut self.enemies_killed,
            RunEventKind::PickupDropped => &mut self.pickups_dropped,
            RunEventKind::PickupCollected => &mut self.pickups_collected,
            RunEventKind::PlayerDamaged => &mut self.player_damaged,
            RunEventKind::PlayerHealed => &mut self.player_healed,
            RunEventKind::Reload => &mut self.reload,
            RunEventKind::Progression => &mut self.progression,
            RunEventKind::Portal => &mut self.portal,
            RunEventKind::Courier => &mut self.courier,
            RunEventKind::Banked => &mut self.banked,
            RunEventKind::RunEnded => &mut self.run_ended,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Collects events while a tick runs; the finished tick stays readable
/// until the next rollover.
#[derive(Debug, Default)]
pub struct RunEventBus {
    current_tick_events: Vec<RunEvent>,
    last_tick_events: Vec<RunEvent>,
    last_tick_counts: RunEventCounts,
}

impl RunEventBus {
    pub fn emit(&mut self, event: RunEvent) {
        self.current_tick_events.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &RunEvent> {
        self.current_tick_events.iter()
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = RunEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.last_tick_events = std::mem::take(&mut self.current_tick_events);
    }

    pub fn last_tick_events(&self) -> &[RunEvent] {
        &self.last_tick_events
    }

    pub fn last_tick_counts(&self) -> RunEventCounts {
        self.last_tick_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollover_counts_and_keeps_last_tick_events() {
        let mut bus = RunEventBus::default();
        bus.emit(RunEvent::ReloadStarted);
        bus.emit(RunEvent::GoldBanked { amount: 40 });
        bus.emit(RunEvent::CourierLeft);
        assert_eq!(bus.iter_emitted_so_far().count(), 3);

        bus.finish_tick_rollover();

        let counts = bus.last_tick_counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.reload, 1);
        assert_eq!(counts.banked, 1);
        assert_eq!(counts.courier, 1);
        assert_eq!(bus.last_tick_events().len(), 3);
        assert_eq!(bus.iter_emitted_so_far().count(), 0);
    }

    #[test]
    fn empty_tick_resets_counts() {
        let mut bus = RunEventBus::default();
        bus.emit(RunEvent::CourierLeft);
        bus.finish_tick_rollover();
        bus.finish_tick_rollover();

        assert_eq!(bus.last_tick_counts(), RunEventCounts::default());
        assert!(bus.last_tick_events().is_empty());
    }
}
