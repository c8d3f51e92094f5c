use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use harvest_engine::{read_text_if_exists, write_text_atomic};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::loadout::{Ability, ResolvedLoadout, WEAPON_CATALOG};

/// Key of the account record inside a [`ProfileStore`].
pub const PROFILE_KEY: &str = "soulHarvestSave";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile io failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("profile json encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for account records.
pub trait ProfileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ProfileStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        read_text_if_exists(&path).map_err(|source| StoreError::Io { path, source })
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        write_text_atomic(&path, value).map_err(|source| StoreError::Io { path, source })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn with_record(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.records.insert(key.to_string(), value.to_string());
        store
    }

    /// Every later write fails, for exercising the swallow-and-warn path.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn record(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }
}

impl ProfileStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable(format!("write to '{key}' refused")));
        }
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub weapon: String,
    pub ability: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentProfile {
    pub total_gold: u64,
    pub blood_shards: u64,
    pub meta_xp: u64,
    pub account_level: u32,
    pub unlocked_weapons: Vec<String>,
    pub unlocked_abilities: Vec<String>,
    pub current_loadout: Loadout,
}

impl Default for PersistentProfile {
    fn default() -> Self {
        Self {
            total_gold: 0,
            blood_shards: 0,
            meta_xp: 0,
            account_level: 1,
            unlocked_weapons: WEAPON_CATALOG
                .iter()
                .map(|weapon| weapon.name.to_string())
                .collect(),
            unlocked_abilities: Ability::CATALOG
                .iter()
                .map(|ability| ability.name().to_string())
                .collect(),
            current_loadout: Loadout {
                weapon: WEAPON_CATALOG[0].name.to_string(),
                ability: Ability::CATALOG[0].name().to_string(),
            },
        }
    }
}

impl PersistentProfile {
    /// Builds a profile from a stored record field by field. Fields that are
    /// missing or malformed keep their defaults and are reported back.
    pub fn from_record(raw: &str) -> (Self, Vec<String>) {
        let mut profile = Self::default();
        let mut issues = Vec::new();

        let fields: Map<String, Value> = match serde_json::from_str(raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                issues.push("record is not a json object".to_string());
                return (profile, issues);
            }
            Err(error) => {
                issues.push(format!("record is not valid json: {error}"));
                return (profile, issues);
            }
        };

        merge_field(&fields, "totalGold", &mut profile.total_gold, &mut issues);
        merge_field(&fields, "bloodShards", &mut profile.blood_shards, &mut issues);
        merge_field(&fields, "metaXp", &mut profile.meta_xp, &mut issues);
        merge_field(&fields, "accountLevel", &mut profile.account_level, &mut issues);
        merge_field(
            &fields,
            "unlockedWeapons",
            &mut profile.unlocked_weapons,
            &mut issues,
        );
        merge_field(
            &fields,
            "unlockedAbilities",
            &mut profile.unlocked_abilities,
            &mut issues,
        );
        merge_field(
            &fields,
            "currentLoadout",
            &mut profile.current_loadout,
            &mut issues,
        );

        profile.normalize();
        (profile, issues)
    }

    pub fn to_record(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores the record invariants: level at least 1, non-empty unlock
    /// lists without duplicates, loadout drawn from the unlock lists.
    pub fn normalize(&mut self) {
        let defaults = Self::default();
        if self.account_level == 0 {
            self.account_level = 1;
        }
        dedup_in_order(&mut self.unlocked_weapons);
        dedup_in_order(&mut self.unlocked_abilities);
        if self.unlocked_weapons.is_empty() {
            self.unlocked_weapons = defaults.unlocked_weapons;
        }
        if self.unlocked_abilities.is_empty() {
            self.unlocked_abilities = defaults.unlocked_abilities;
        }
        clamp_to_unlocked(&mut self.current_loadout.weapon, &self.unlocked_weapons);
        clamp_to_unlocked(&mut self.current_loadout.ability, &self.unlocked_abilities);
    }

    /// Adds meta XP and applies every account level it pays for. Returns the
    /// number of levels gained.
    pub fn add_meta_xp(&mut self, amount: u64, level_step: u64) -> u32 {
        self.meta_xp = self.meta_xp.saturating_add(amount);
        let mut gained = 0;
        loop {
            let threshold = u64::from(self.account_level).saturating_mul(level_step);
            if threshold == 0 || self.meta_xp < threshold {
                break;
            }
            self.meta_xp -= threshold;
            self.account_level = self.account_level.saturating_add(1);
            gained += 1;
        }
        gained
    }

    pub fn resolved_loadout(&self) -> ResolvedLoadout {
        ResolvedLoadout::from_names(&self.current_loadout.weapon, &self.current_loadout.ability)
    }
}

fn merge_field<T: serde::de::DeserializeOwned>(
    fields: &Map<String, Value>,
    key: &str,
    slot: &mut T,
    issues: &mut Vec<String>,
) {
    let Some(value) = fields.get(key) else {
        return;
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => *slot = parsed,
        Err(error) => issues.push(format!("{key}: {error}")),
    }
}

fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|value| {
        if seen.contains(value) {
            false
        } else {
            seen.push(value.clone());
            true
        }
    });
}

fn clamp_to_unlocked(selected: &mut String, unlocked: &[String]) {
    if !unlocked.contains(selected) {
        if let Some(first) = unlocked.first() {
            *selected = first.clone();
        }
    }
}

/// The loaded profile plus the store it flushes to. The in-memory profile
/// stays authoritative when a write fails.
pub struct Account {
    profile: PersistentProfile,
    store: Box<dyn ProfileStore>,
    writes: u32,
    failed_writes: u32,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("profile", &self.profile)
            .field("writes", &self.writes)
            .field("failed_writes", &self.failed_writes)
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Never fails: a missing, unreadable or corrupt record yields defaults.
    pub fn open(store: Box<dyn ProfileStore>) -> Self {
        let profile = match store.read(PROFILE_KEY) {
            Ok(Some(raw)) => {
                let (profile, issues) = PersistentProfile::from_record(&raw);
                for issue in &issues {
                    warn!(key = PROFILE_KEY, issue = %issue, "profile_field_defaulted");
                }
                profile
            }
            Ok(None) => {
                info!(key = PROFILE_KEY, "profile_missing_using_defaults");
                PersistentProfile::default()
            }
            Err(error) => {
                warn!(key = PROFILE_KEY, error = %error, "profile_read_failed");
                PersistentProfile::default()
            }
        };
        info!(
            total_gold = profile.total_gold,
            blood_shards = profile.blood_shards,
            account_level = profile.account_level,
            weapon = %profile.current_loadout.weapon,
            ability = %profile.current_loadout.ability,
            "profile_loaded"
        );
        Self {
            profile,
            store,
            writes: 0,
            failed_writes: 0,
        }
    }

    pub fn profile(&self) -> &PersistentProfile {
        &self.profile
    }

    /// Successful flushes since the account was opened.
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    pub fn failed_write_count(&self) -> u32 {
        self.failed_writes
    }

    /// Applies `change` and flushes the whole record once.
    pub fn update<R>(
        &mut self,
        reason: &'static str,
        change: impl FnOnce(&mut PersistentProfile) -> R,
    ) -> R {
        let result = change(&mut self.profile);
        self.flush(reason);
        result
    }

    pub fn set_loadout(&mut self, weapon: &str, ability: &str) {
        self.update("loadout", |profile| {
            profile.current_loadout = Loadout {
                weapon: weapon.to_string(),
                ability: ability.to_string(),
            };
            profile.normalize();
        });
    }

    fn flush(&mut self, reason: &'static str) {
        let written = self
            .profile
            .to_record()
            .and_then(|record| self.store.write(PROFILE_KEY, &record));
        match written {
            Ok(()) => {
                self.writes = self.writes.saturating_add(1);
                info!(
                    reason,
                    total_gold = self.profile.total_gold,
                    blood_shards = self.profile.blood_shards,
                    meta_xp = self.profile.meta_xp,
                    account_level = self.profile.account_level,
                    "profile_saved"
                );
            }
            Err(error) => {
                self.failed_writes = self.failed_writes.saturating_add(1);
                warn!(reason, error = %error, "profile_save_failed");
            }
        }
    }
}
