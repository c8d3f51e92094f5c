use std::process::ExitCode;

use harvest_engine::{run_app, InputSnapshot};
use tracing::{error, info, warn};

use super::bootstrap::{AppWiring, BootstrapError};

pub fn run(app: Result<AppWiring, BootstrapError>) -> ExitCode {
    let AppWiring {
        config,
        mut scene,
        seed,
    } = match app {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let summary = run_app(&config, &mut scene, &mut |_tick: u64| InputSnapshot::empty());

    let run = scene.run();
    let account = run.account();
    let profile = account.profile();
    info!(
        exit = ?summary.exit,
        ticks = summary.ticks_run,
        simulated_s = summary.simulated.as_secs_f32(),
        seed,
        phase = ?run.phase(),
        level = run.state().level,
        total_gold = profile.total_gold,
        blood_shards = profile.blood_shards,
        meta_xp = profile.meta_xp,
        account_level = profile.account_level,
        "run_outcome"
    );
    if account.failed_write_count() > 0 {
        warn!(
            failed_writes = account.failed_write_count(),
            "profile_not_fully_saved"
        );
    }

    ExitCode::SUCCESS
}
