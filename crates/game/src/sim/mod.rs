//! Game rules for one Soul Harvest run: pools of enemies and loot, timers,
//! combat, levelling, and the currency that survives between runs.

pub mod combat;
pub mod config;
pub mod context;
pub mod economy;
pub mod entities;
pub mod events;
pub mod loadout;
pub mod physics;
pub mod profile;
pub mod progression;
pub mod run;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tasks;
pub mod world;

pub use combat::OverlapPair;
pub use config::{ConfigError, RunConfig};
pub use entities::PickupKind;
pub use events::RunEvent;
pub use profile::{Account, JsonFileStore, MemoryStore, PersistentProfile, ProfileStore};
pub use progression::UpgradeKind;
pub use run::RunSimulation;
pub use snapshot::{Banner, HudSnapshot};
pub use state::RunPhase;

#[cfg(test)]
mod tests;
