//! Glue between the capture loop, the detection engine and the gesture core.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::camera::CameraFrame;
use crate::gesture::GestureMapper;
use crate::pointer::PointerSink;
use crate::snapshot::SnapshotStore;

use super::{DetectionEngine, DetectionResult, ResultCallback};

/// Strictly increasing millisecond timestamps relative to a start instant
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Option<u64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self { start, last: None }
    }

    /// Timestamp for a frame captured at `at`.
    ///
    /// Never returns the same value twice; a frame that lands on (or
    /// before) the previous millisecond is bumped past it.
    pub fn stamp(&mut self, at: Instant) -> u64 {
        let elapsed = at.saturating_duration_since(self.start).as_millis() as u64;
        let ts = match self.last {
            Some(last) if elapsed <= last => last + 1,
            _ => elapsed,
        };
        self.last = Some(ts);
        ts
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters shared by the bridge and its result handler
#[derive(Debug, Default)]
pub struct DetectionStats {
    /// Frames accepted by the engine
    pub submitted: AtomicU64,
    /// Frames the engine refused (saturated)
    pub dropped: AtomicU64,
    /// Results that carried a hand
    pub hands: AtomicU64,
    /// Results with no hand in view
    pub empty: AtomicU64,
    /// Results the engine reported as failed
    pub failures: AtomicU64,
    /// Results that arrived older than one already processed
    pub out_of_order: AtomicU64,
    /// Pointer commands issued
    pub commands: AtomicU64,
}

impl DetectionStats {
    pub fn delivered(&self) -> u64 {
        self.hands.load(Ordering::Relaxed)
            + self.empty.load(Ordering::Relaxed)
            + self.failures.load(Ordering::Relaxed)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            submitted = self.submitted.load(Ordering::Relaxed),
            dropped = self.dropped.load(Ordering::Relaxed),
            hands = self.hands.load(Ordering::Relaxed),
            empty = self.empty.load(Ordering::Relaxed),
            failures = self.failures.load(Ordering::Relaxed),
            out_of_order = self.out_of_order.load(Ordering::Relaxed),
            commands = self.commands.load(Ordering::Relaxed),
            "detection summary"
        );
    }
}

/// Completion handler registered with the detection engine.
///
/// Owns the gesture mapper and the pointer sink; it is the only code that
/// touches either.
pub struct ResultHandler {
    mapper: GestureMapper,
    sink: Box<dyn PointerSink + Send>,
    snapshot: SnapshotStore,
    stats: Arc<DetectionStats>,
    latest_timestamp: Option<u64>,
}

impl ResultHandler {
    pub fn new(mapper: GestureMapper, sink: Box<dyn PointerSink + Send>, snapshot: SnapshotStore) -> Self {
        Self {
            mapper,
            sink,
            snapshot,
            stats: Arc::new(DetectionStats::default()),
            latest_timestamp: None,
        }
    }

    pub fn stats(&self) -> Arc<DetectionStats> {
        self.stats.clone()
    }

    /// Handle one detection result.
    ///
    /// Failed results are dropped untouched. Results that arrive out of
    /// submission order are still processed: the latest arrival wins.
    pub fn handle(&mut self, result: DetectionResult) {
        let latest = match self.latest_timestamp {
            Some(latest) => {
                if result.timestamp_ms < latest {
                    self.stats.out_of_order.fetch_add(1, Ordering::Relaxed);
                    log::debug!(
                        "Result for t={}ms arrived after t={}ms",
                        result.timestamp_ms,
                        latest
                    );
                }
                latest.max(result.timestamp_ms)
            }
            None => result.timestamp_ms,
        };
        self.latest_timestamp = Some(latest);

        let hands = match result.outcome {
            Ok(hands) => hands,
            Err(e) => {
                let failures = self.stats.failures.fetch_add(1, Ordering::Relaxed) + 1;
                // Expected under normal operation; keep it quiet
                if failures == 1 || failures % 100 == 0 {
                    log::debug!("Detection failed for frame {} ({} so far): {}", result.frame_number, failures, e);
                }
                return;
            }
        };

        // Only the first hand drives the pointer
        match hands.first() {
            Some(hand) => {
                self.stats.hands.fetch_add(1, Ordering::Relaxed);
                let commands = self.mapper.process(&hand.landmarks, hand.handedness);
                self.stats
                    .commands
                    .fetch_add(commands.len() as u64, Ordering::Relaxed);
                for command in commands {
                    self.sink.apply(command);
                }
                self.snapshot.update(&hand.landmarks, hand.handedness);
            }
            None => {
                self.stats.empty.fetch_add(1, Ordering::Relaxed);
                self.snapshot.clear();
            }
        }
    }

    /// Box the handler as an engine callback
    pub fn into_callback(mut self) -> ResultCallback {
        Box::new(move |result| self.handle(result))
    }
}

impl Drop for ResultHandler {
    fn drop(&mut self) {
        // Never leave the button held after teardown
        for command in self.mapper.release_all() {
            log::info!("Releasing held pointer button on shutdown");
            self.sink.apply(command);
        }
    }
}

/// Front end of the detection engine used by the capture loop
pub struct DetectionBridge<E: DetectionEngine> {
    engine: E,
    clock: FrameClock,
    stats: Arc<DetectionStats>,
    stopped: bool,
}

impl<E: DetectionEngine> DetectionBridge<E> {
    pub fn new(engine: E, stats: Arc<DetectionStats>) -> Self {
        Self {
            engine,
            clock: FrameClock::new(),
            stats,
            stopped: false,
        }
    }

    /// Stamp and submit a frame. Never blocks; returns whether the engine
    /// accepted it.
    pub fn submit(&mut self, frame: CameraFrame) -> bool {
        if self.stopped {
            return false;
        }
        let timestamp_ms = self.clock.stamp(frame.timestamp);
        let accepted = self.engine.submit(frame, timestamp_ms);
        let counter = if accepted {
            &self.stats.submitted
        } else {
            &self.stats.dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
        accepted
    }

    pub fn stats(&self) -> &Arc<DetectionStats> {
        &self.stats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Stop submitting and flush every in-flight result
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.engine.shutdown();
        log::info!("Detection bridge stopped");
    }
}

impl<E: DetectionEngine> Drop for DetectionBridge<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
