use std::env;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

pub mod app;
pub mod pool;
pub mod schedule;
pub mod storage;

pub use app::{
    run_app, InputAction, InputSnapshot, InputSource, LoopConfig, LoopExit,
    LoopMetricsSnapshot, LoopPacing, LoopSummary, MoveAxes, Scene, SceneCommand, Vec2,
};
pub use pool::{ActivatableEntity, EntityPool, PoolHandle};
pub use schedule::{DueTask, ScheduledTaskQueue, TaskId};
pub use storage::{read_text_if_exists, write_bytes_atomic, write_text_atomic};

pub const DATA_DIR_ENV_VAR: &str = "SOUL_HARVEST_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "saves";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{var} is set but empty")]
    EmptyDataDir { var: &'static str },
}

/// Resolves (and creates) the directory that holds persistent profile data.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let data_dir = resolve_data_dir()?;
    fs::create_dir_all(&data_dir).map_err(|source| StartupError::CreateDataDir {
        path: data_dir.clone(),
        source,
    })?;
    Ok(AppPaths { data_dir })
}

fn resolve_data_dir() -> Result<PathBuf, StartupError> {
    match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) if value.trim().is_empty() => Err(StartupError::EmptyDataDir {
            var: DATA_DIR_ENV_VAR,
        }),
        Ok(value) => Ok(PathBuf::from(value)),
        Err(env::VarError::NotPresent) => {
            let cwd = env::current_dir().map_err(StartupError::CurrentDir)?;
            Ok(cwd.join(DEFAULT_DATA_DIR))
        }
        Err(source) => Err(StartupError::EnvVar {
            var: DATA_DIR_ENV_VAR,
            source,
        }),
    }
}
