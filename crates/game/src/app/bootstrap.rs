use std::env;
use std::path::PathBuf;

use harvest_engine::{resolve_app_paths, LoopConfig, LoopPacing, StartupError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::autopilot::Autopilot;
use super::harvest_scene::HarvestScene;
use crate::sim::{Account, ConfigError, JsonFileStore, RunConfig, RunSimulation};

const CONFIG_ENV_VAR: &str = "SOUL_HARVEST_CONFIG";
const SEED_ENV_VAR: &str = "SOUL_HARVEST_SEED";
const REALTIME_ENV_VAR: &str = "SOUL_HARVEST_REALTIME";
/// Twenty simulated minutes at the default tick rate.
const MAX_RUN_TICKS: u64 = 60 * 60 * 20;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{var}='{value}' is not a valid {expected}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

pub struct AppWiring {
    pub config: LoopConfig,
    pub scene: HarvestScene,
    pub seed: u64,
}

pub fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Soul Harvest Startup ===");

    let run_config = load_run_config()?;
    let paths = resolve_app_paths()?;
    info!(data_dir = %paths.data_dir.display(), "profile_store_ready");
    let account = Account::open(Box::new(JsonFileStore::new(paths.data_dir)));

    let seed = resolve_seed()?;
    info!(seed, "run_seed");
    let run = RunSimulation::start(run_config, account, StdRng::seed_from_u64(seed));

    let config = LoopConfig {
        pacing: resolve_pacing(),
        max_ticks: Some(MAX_RUN_TICKS),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: HarvestScene::new(run, Some(Autopilot::default())),
        seed,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

fn load_run_config() -> Result<RunConfig, BootstrapError> {
    let Some(path) = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) else {
        info!("run_config_defaults");
        return Ok(RunConfig::default());
    };
    let config = RunConfig::load(&path)?;
    info!(path = %path.display(), "run_config_loaded");
    Ok(config)
}

fn resolve_seed() -> Result<u64, BootstrapError> {
    match env::var(SEED_ENV_VAR) {
        Ok(raw) => parse_seed(raw),
        Err(_) => Ok(rand::random()),
    }
}

fn parse_seed(raw: String) -> Result<u64, BootstrapError> {
    raw.trim().parse().map_err(|_| BootstrapError::InvalidEnv {
        var: SEED_ENV_VAR,
        value: raw,
        expected: "u64 seed",
    })
}

fn resolve_pacing() -> LoopPacing {
    parse_pacing(env::var(REALTIME_ENV_VAR).ok().as_deref())
}

fn parse_pacing(raw: Option<&str>) -> LoopPacing {
    match raw.map(str::trim) {
        Some("1") | Some("true") => LoopPacing::Realtime,
        _ => LoopPacing::Unthrottled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_accepts_surrounding_whitespace() {
        let seed = parse_seed(" 1234\n".to_string()).expect("seed");
        assert_eq!(seed, 1234);
    }

    #[test]
    fn seed_rejects_non_numeric_values() {
        let err = parse_seed("abc".to_string()).expect_err("invalid seed");
        assert_eq!(
            err.to_string(),
            "SOUL_HARVEST_SEED='abc' is not a valid u64 seed"
        );
    }

    #[test]
    fn realtime_pacing_needs_an_explicit_opt_in() {
        assert_eq!(parse_pacing(Some("1")), LoopPacing::Realtime);
        assert_eq!(parse_pacing(Some("true")), LoopPacing::Realtime);
        assert_eq!(parse_pacing(Some("yes")), LoopPacing::Unthrottled);
        assert_eq!(parse_pacing(None), LoopPacing::Unthrottled);
    }
}
