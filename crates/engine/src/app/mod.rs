mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{InputAction, MoveAxes};
pub use loop_runner::{run_app, InputSource, LoopConfig, LoopExit, LoopPacing, LoopSummary};
pub use metrics::LoopMetricsSnapshot;
pub use scene::{InputSnapshot, Scene, SceneCommand, Vec2};
