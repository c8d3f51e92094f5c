use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::metrics::MetricsAccumulator;
use super::{InputSnapshot, Scene, SceneCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPacing {
    /// Ticks are paced against the wall clock through an accumulator.
    Realtime,
    /// Ticks run back to back; simulated time is decoupled from wall time.
    Unthrottled,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub pacing: LoopPacing,
    pub max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            pacing: LoopPacing::Unthrottled,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    SceneFinished,
    QuitRequested,
    TickBudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub exit: LoopExit,
    pub ticks_run: u64,
    pub simulated: Duration,
    pub dropped_backlog: Duration,
}

/// Supplies the input snapshot consumed by one fixed tick.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot;
}

impl<F> InputSource for F
where
    F: FnMut(u64) -> InputSnapshot,
{
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        self(tick)
    }
}

struct TickDriver<'a> {
    scene: &'a mut dyn Scene,
    input: &'a mut dyn InputSource,
    fixed_dt: Duration,
    max_ticks: Option<u64>,
    ticks_run: u64,
}

impl TickDriver<'_> {
    fn step(&mut self) -> ControlFlow<LoopExit> {
        if self.max_ticks.is_some_and(|cap| self.ticks_run >= cap) {
            return ControlFlow::Break(LoopExit::TickBudgetExhausted);
        }
        let snapshot = self.input.snapshot_for_tick(self.ticks_run);
        if snapshot.quit_requested() {
            return ControlFlow::Break(LoopExit::QuitRequested);
        }
        let command = self.scene.update(self.fixed_dt, &snapshot);
        self.ticks_run = self.ticks_run.saturating_add(1);
        match command {
            SceneCommand::Finish => ControlFlow::Break(LoopExit::SceneFinished),
            SceneCommand::None => ControlFlow::Continue(()),
        }
    }
}

pub fn run_app(
    config: &LoopConfig,
    scene: &mut dyn Scene,
    input: &mut dyn InputSource,
) -> LoopSummary {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        pacing = ?config.pacing,
        max_ticks = ?config.max_ticks,
        "loop_config"
    );

    scene.load();
    let mut driver = TickDriver {
        scene,
        input,
        fixed_dt,
        max_ticks: config.max_ticks,
        ticks_run: 0,
    };
    let mut metrics = MetricsAccumulator::new(metrics_log_interval);
    let mut dropped_backlog = Duration::ZERO;

    let exit = match config.pacing {
        LoopPacing::Unthrottled => loop {
            let frame_start = Instant::now();
            if let ControlFlow::Break(exit) = driver.step() {
                break exit;
            }
            metrics.record_tick(fixed_dt);
            metrics.record_frame(Instant::now().saturating_duration_since(frame_start));
            if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
                debug!(
                    tps = snapshot.tps,
                    sim_speed = snapshot.sim_speed,
                    "loop_metrics"
                );
            }
        },
        LoopPacing::Realtime => {
            let mut accumulator = Duration::ZERO;
            let mut last_frame_instant = Instant::now();
            'frames: loop {
                let now = Instant::now();
                let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                last_frame_instant = now;
                accumulator =
                    accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

                let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                for _ in 0..step_plan.ticks_to_run {
                    if let ControlFlow::Break(exit) = driver.step() {
                        break 'frames exit;
                    }
                    metrics.record_tick(fixed_dt);
                }
                accumulator = step_plan.remaining_accumulator;

                if step_plan.dropped_backlog > Duration::ZERO {
                    dropped_backlog = dropped_backlog.saturating_add(step_plan.dropped_backlog);
                    warn!(
                        dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                        max_ticks_per_frame, "sim_clamp_triggered"
                    );
                }

                metrics.record_frame(raw_frame_dt);
                if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
                    debug!(
                        fps = snapshot.fps,
                        tps = snapshot.tps,
                        frame_time_ms = snapshot.frame_time_ms,
                        "loop_metrics"
                    );
                }

                let spent = Instant::now().saturating_duration_since(now);
                let idle = fixed_dt.saturating_sub(spent);
                if idle > Duration::ZERO {
                    thread::sleep(idle);
                }
            }
        }
    };

    let ticks_run = driver.ticks_run;
    if let Some(title) = driver.scene.debug_title() {
        info!(title = %title, "scene_status");
    }
    driver.scene.unload();
    info!(exit = ?exit, ticks_run, "loop_finished");

    LoopSummary {
        exit,
        ticks_run,
        simulated: fixed_dt.saturating_mul(u32::try_from(ticks_run).unwrap_or(u32::MAX)),
        dropped_backlog,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
