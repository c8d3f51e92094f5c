use harvest_engine::PoolHandle;

/// Everything the run schedules against simulation time. Handlers re-check
/// liveness of any handle they carry before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    EnemyWave,
    CourierRoll,
    AutoFire,
    PassiveHeal,
    ReloadComplete,
    InvulnerabilityEnd,
    CourierDespawn { courier: PoolHandle },
}
