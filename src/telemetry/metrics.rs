//! Frame timing and per-stage latency statistics

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Timing statistics over a window of samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    /// Average time in milliseconds
    pub avg_ms: f64,
    /// Minimum time in milliseconds
    pub min_ms: f64,
    /// Maximum time in milliseconds
    pub max_ms: f64,
    /// 95th percentile
    pub p95_ms: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

impl FrameStats {
    fn from_durations<'a>(durations: impl Iterator<Item = &'a Duration>) -> Self {
        let mut times: Vec<f64> = durations.map(|d| d.as_secs_f64() * 1000.0).collect();
        if times.is_empty() {
            return Self::default();
        }
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = times.iter().sum();
        Self {
            avg_ms: sum / times.len() as f64,
            min_ms: times.first().copied().unwrap_or(0.0),
            max_ms: times.last().copied().unwrap_or(0.0),
            p95_ms: percentile(&times, 0.95),
            sample_count: times.len(),
        }
    }
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx]
}

/// Frame profiler for the render loop
pub struct FrameProfiler {
    /// Frame durations
    frame_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Last frame start time
    last_frame_start: Option<Instant>,
}

impl Default for FrameProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProfiler {
    /// Keeps 10 seconds at 30fps
    pub fn new() -> Self {
        Self::with_capacity(300)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            last_frame_start: None,
        }
    }

    /// Mark the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.begin_frame_at(Instant::now());
    }

    pub fn begin_frame_at(&mut self, now: Instant) {
        if let Some(start) = self.last_frame_start {
            self.frame_times.push_back(now.saturating_duration_since(start));
            if self.frame_times.len() > self.max_samples {
                self.frame_times.pop_front();
            }
        }
        self.last_frame_start = Some(now);
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats::from_durations(self.frame_times.iter())
    }

    /// Frames per second over the sample window
    pub fn fps(&self) -> f64 {
        let total: Duration = self.frame_times.iter().sum();
        if total.is_zero() {
            0.0
        } else {
            self.frame_times.len() as f64 / total.as_secs_f64()
        }
    }
}

/// Pipeline stages timed by the capture/render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Pulling a frame from the source
    Capture,
    /// Handing the frame to the detector
    Submit,
    /// Overlay and preview output
    Render,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Capture, Stage::Submit, Stage::Render];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Submit => "submit",
            Stage::Render => "render",
        }
    }
}

/// Bounded latency history per stage
pub struct StageTimings {
    samples: BTreeMap<Stage, VecDeque<Duration>>,
    max_samples: usize,
    started: Instant,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl StageTimings {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: BTreeMap::new(),
            max_samples: max_samples.max(1),
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, stage: Stage, duration: Duration) {
        let window = self.samples.entry(stage).or_default();
        window.push_back(duration);
        if window.len() > self.max_samples {
            window.pop_front();
        }
    }

    /// Run `f` and record how long it took
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.record(stage, start.elapsed());
        value
    }

    pub fn stats(&self, stage: Stage) -> FrameStats {
        self.samples
            .get(&stage)
            .map(|window| FrameStats::from_durations(window.iter()))
            .unwrap_or_default()
    }

    pub fn report(&self) -> TimingReport {
        TimingReport {
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            stages: Stage::ALL
                .iter()
                .map(|&stage| (stage, self.stats(stage)))
                .filter(|(_, stats)| stats.sample_count > 0)
                .collect(),
        }
    }
}

/// Summary written at shutdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingReport {
    pub elapsed_secs: f64,
    pub stages: BTreeMap<Stage, FrameStats>,
}

impl TimingReport {
    pub fn log_summary(&self) {
        for (stage, stats) in &self.stages {
            tracing::info!(
                stage = stage.as_str(),
                avg_ms = format!("{:.3}", stats.avg_ms),
                max_ms = format!("{:.3}", stats.max_ms),
                min_ms = format!("{:.3}", stats.min_ms),
                samples = stats.sample_count,
                "stage timing"
            );
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_profiler() {
        let mut profiler = FrameProfiler::new();
        let start = Instant::now();
        for i in 0..11 {
            profiler.begin_frame_at(start + Duration::from_millis(i * 20));
        }

        let stats = profiler.stats();
        assert_eq!(stats.sample_count, 10);
        assert!((stats.avg_ms - 20.0).abs() < 1e-6);
        assert!((profiler.fps() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_profiler_window_is_bounded() {
        let mut profiler = FrameProfiler::with_capacity(4);
        let start = Instant::now();
        for i in 0..10 {
            profiler.begin_frame_at(start + Duration::from_millis(i));
        }
        assert_eq!(profiler.stats().sample_count, 4);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 0.5), 5.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 10.0);
    }

    #[test]
    fn test_stage_timings() {
        let mut timings = StageTimings::new(100);
        timings.record(Stage::Capture, Duration::from_millis(2));
        timings.record(Stage::Capture, Duration::from_millis(4));
        timings.record(Stage::Render, Duration::from_millis(1));

        let capture = timings.stats(Stage::Capture);
        assert!((capture.avg_ms - 3.0).abs() < 1e-9);
        assert!((capture.min_ms - 2.0).abs() < 1e-9);
        assert!((capture.max_ms - 4.0).abs() < 1e-9);

        let report = timings.report();
        assert_eq!(report.stages.len(), 2);
        assert!(!report.stages.contains_key(&Stage::Submit));
    }

    #[test]
    fn test_time_closure() {
        let mut timings = StageTimings::default();
        let value = timings.time(Stage::Submit, || 7);
        assert_eq!(value, 7);
        assert_eq!(timings.stats(Stage::Submit).sample_count, 1);
    }

    #[test]
    fn test_report_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timings.json");
        let mut timings = StageTimings::default();
        timings.record(Stage::Capture, Duration::from_millis(3));
        timings.report().save(&path).unwrap();

        let loaded: TimingReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.stages[&Stage::Capture].sample_count, 1);
    }
}
