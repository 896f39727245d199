//! Telemetry and logging infrastructure
//!
//! Structured logging with tracing, plus frame and pipeline-stage timing.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogGuard};
pub use metrics::{FrameProfiler, FrameStats, Stage, StageTimings, TimingReport};
