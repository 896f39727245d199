//! Capture/render loop

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::camera::CaptureSource;
use crate::detection::{DetectionBridge, DetectionEngine};
use crate::render::{draw_landmarks, RenderSink};
use crate::snapshot::SnapshotStore;
use crate::telemetry::{Stage, StageTimings, TimingReport};

/// Owns the capture source, the detection front end and the preview.
///
/// Pointer control happens on the detection thread; this loop only feeds
/// frames in and draws whatever the latest snapshot holds.
pub struct VirtualTouchApp<C: CaptureSource, E: DetectionEngine, R: RenderSink> {
    source: C,
    bridge: DetectionBridge<E>,
    snapshot: SnapshotStore,
    render: R,
    mirror: bool,
    max_frames: Option<u64>,
    timings: StageTimings,
    timings_report: Option<PathBuf>,
    frames: u64,
}

impl<C: CaptureSource, E: DetectionEngine, R: RenderSink> VirtualTouchApp<C, E, R> {
    pub fn new(source: C, bridge: DetectionBridge<E>, snapshot: SnapshotStore, render: R) -> Self {
        Self {
            source,
            bridge,
            snapshot,
            render,
            mirror: true,
            max_frames: None,
            timings: StageTimings::default(),
            timings_report: None,
            frames: 0,
        }
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_timings_report(mut self, path: Option<PathBuf>) -> Self {
        self.timings_report = path;
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    /// Run until the source ends, `max_frames` is reached or `stop` is set.
    /// Returns the number of frames processed by this call.
    pub fn run(&mut self, stop: &AtomicBool) -> u64 {
        let (width, height) = self.source.resolution();
        log::info!(
            "Capture loop started ({}x{}, mirror: {})",
            width,
            height,
            self.mirror
        );
        let start_frames = self.frames;

        while !stop.load(Ordering::Relaxed) {
            if self.max_frames.is_some_and(|max| self.frames >= max) {
                log::info!("Reached frame limit ({})", self.frames);
                break;
            }
            if !self.tick() {
                log::info!("Capture source exhausted");
                break;
            }
        }

        self.frames - start_frames
    }

    /// One iteration: capture, submit, overlay, show. False once the
    /// source has nothing left.
    fn tick(&mut self) -> bool {
        let started = Instant::now();
        let Some(mut frame) = self.source.next_frame() else {
            return false;
        };
        if self.mirror {
            frame.mirror_horizontal();
        }
        self.timings.record(Stage::Capture, started.elapsed());

        let submit_started = Instant::now();
        if !self.bridge.submit(frame.clone()) {
            log::trace!("Detector busy, frame {} skipped", frame.frame_number);
        }
        self.timings.record(Stage::Submit, submit_started.elapsed());

        let render_started = Instant::now();
        let snapshot = self.snapshot.read();
        if !snapshot.is_empty() {
            draw_landmarks(&mut frame, &snapshot.landmarks);
        }
        self.render.show(&frame);
        self.timings.record(Stage::Render, render_started.elapsed());

        self.frames += 1;
        true
    }

    /// Stop submitting, wait for in-flight results, then report.
    pub fn shutdown(&mut self) -> TimingReport {
        self.bridge.shutdown();
        self.bridge.stats().log_summary();

        let report = self.timings.report();
        report.log_summary();
        if let Some(path) = &self.timings_report {
            match report.save(path) {
                Ok(()) => log::info!("Timing report written to {:?}", path),
                Err(e) => log::warn!("Failed to write timing report {:?}: {}", path, e),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::camera::{CameraFrame, FrameSequence};
    use crate::detection::{DetectionWorker, ResultHandler, ScriptedModel};
    use crate::gesture::{GestureMapper, ScreenMapper};
    use crate::landmarks::{HandDetection, Handedness, LandmarkPoint};
    use crate::pointer::{PointerButton, PointerCommand, RecordingSink, ScreenSize};
    use crate::render::MARKER_COLOR;

    #[derive(Default)]
    struct CollectRender {
        frames: Vec<CameraFrame>,
    }

    impl RenderSink for CollectRender {
        fn show(&mut self, frame: &CameraFrame) {
            self.frames.push(frame.clone());
        }
    }

    fn fist() -> HandDetection {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5); 21];
        points[4] = LandmarkPoint::new(0.45, 0.5);
        for tip in [8, 12, 16, 20] {
            points[tip] = LandmarkPoint::new(0.5, 0.6);
        }
        HandDetection::new(points, Handedness::Right)
    }

    fn two_fingers() -> HandDetection {
        let mut hand = fist();
        hand.landmarks[8].y = 0.3;
        hand.landmarks[12].y = 0.3;
        hand
    }

    fn build(
        script: Vec<Result<Vec<HandDetection>, String>>,
        frames: usize,
    ) -> (
        VirtualTouchApp<FrameSequence, DetectionWorker, CollectRender>,
        RecordingSink,
        SnapshotStore,
    ) {
        let screen = ScreenSize::new(1920, 1080);
        let sink = RecordingSink::with_screen(screen);
        let snapshot = SnapshotStore::new();
        let mapper = GestureMapper::new(ScreenMapper::new(640, 480, 170.0, screen));
        let handler = ResultHandler::new(mapper, Box::new(sink.clone()), snapshot.clone());
        let stats = handler.stats();

        let worker = DetectionWorker::spawn(ScriptedModel::new(script), frames + 1, handler.into_callback()).unwrap();
        let bridge = DetectionBridge::new(worker, stats);
        let app = VirtualTouchApp::new(
            FrameSequence::blank(frames, 64, 48),
            bridge,
            snapshot.clone(),
            CollectRender::default(),
        )
        .with_mirror(false);
        (app, sink, snapshot)
    }

    #[test]
    fn test_end_to_end_gestures() {
        let script = vec![
            Ok(vec![fist()]),
            Ok(vec![two_fingers()]),
            Ok(vec![two_fingers()]),
            Ok(vec![]),
        ];
        let (mut app, sink, snapshot) = build(script, 4);

        let stop = AtomicBool::new(false);
        assert_eq!(app.run(&stop), 4);
        app.shutdown();
        let stats = app.bridge.stats().clone();
        assert_eq!(stats.submitted.load(Ordering::Relaxed), 4);
        assert_eq!(stats.delivered(), 4);
        // Worker joined and handler dropped: drag released exactly once
        drop(app);

        let commands = sink.commands();
        assert_eq!(commands[0], PointerCommand::Click(PointerButton::ScrollDown));
        assert_eq!(commands[1], PointerCommand::Press(PointerButton::Left));
        assert!(matches!(commands[2], PointerCommand::Move { .. }));
        assert!(matches!(commands[3], PointerCommand::Move { .. }));
        assert_eq!(commands.last(), Some(&PointerCommand::Release(PointerButton::Left)));
        assert_eq!(commands.len(), 5);

        // Last result had no hand
        assert!(snapshot.read().is_empty());
    }

    #[test]
    fn test_max_frames_and_stop_flag() {
        let (app, _sink, _snapshot) = build(Vec::new(), 10);
        let mut app = app.with_max_frames(Some(3));
        let stop = AtomicBool::new(false);
        assert_eq!(app.run(&stop), 3);

        stop.store(true, Ordering::Relaxed);
        let mut app = app.with_max_frames(None);
        assert_eq!(app.run(&stop), 0);
        assert_eq!(app.frames(), 3);
        app.shutdown();
    }

    #[test]
    fn test_overlay_follows_snapshot() {
        // A failed result leaves the snapshot alone
        let (mut app, _sink, snapshot) = build(vec![Err("no model".into())], 1);
        snapshot.update(&[LandmarkPoint::new(0.5, 0.5)], Handedness::Left);

        let stop = AtomicBool::new(false);
        app.run(&stop);
        assert_eq!(app.render().frames.len(), 1);
        assert_eq!(app.render().frames[0].pixel(32, 24), Some(MARKER_COLOR));
        app.shutdown();
    }

    #[test]
    fn test_shutdown_writes_timing_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timings.json");
        let (app, _sink, _snapshot) = build(Vec::new(), 2);
        let mut app = app.with_timings_report(Some(path.clone()));

        let stop = AtomicBool::new(false);
        app.run(&stop);
        let report = app.shutdown();

        assert_eq!(report.stages[&Stage::Capture].sample_count, 2);
        assert!(path.exists());
    }
}
