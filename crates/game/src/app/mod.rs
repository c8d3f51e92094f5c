//! Headless host: wiring, the engine loop, and the autopilot that plays.

pub mod autopilot;
pub mod bootstrap;
pub mod harvest_scene;
pub mod loop_runner;

use std::process::ExitCode;

pub fn run() -> ExitCode {
    loop_runner::run(bootstrap::build_app())
}
