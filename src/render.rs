//! Preview rendering
//!
//! The render loop draws the latest landmark snapshot over the frame and
//! hands it to a [`RenderSink`]. Nothing here affects pointer control.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::camera::CameraFrame;
use crate::error::CaptureError;
use crate::landmarks::LandmarkPoint;
use crate::telemetry::FrameProfiler;

/// Marker radius in pixels
pub const MARKER_RADIUS: i32 = 5;
/// Marker color (RGBA magenta)
pub const MARKER_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Stamp a filled marker at every landmark
pub fn draw_landmarks(frame: &mut CameraFrame, landmarks: &[LandmarkPoint]) {
    for point in landmarks {
        let (cx, cy) = point.to_pixels(frame.width, frame.height);
        fill_circle(frame, cx as i32, cy as i32, MARKER_RADIUS, MARKER_COLOR);
    }
}

fn fill_circle(frame: &mut CameraFrame, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
    let (w, h) = (frame.width as i32, frame.height as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let idx = ((y * w + x) * 4) as usize;
            if let Some(px) = frame.data.get_mut(idx..idx + 4) {
                px.copy_from_slice(&color);
            }
        }
    }
}

/// Consumer of preview frames
pub trait RenderSink {
    fn show(&mut self, frame: &CameraFrame);
}

/// Renders nowhere; tracks and periodically logs the preview FPS
pub struct HeadlessRender {
    profiler: FrameProfiler,
    log_interval: Duration,
    last_log: Instant,
    frames: u64,
}

impl HeadlessRender {
    pub fn new(log_interval: Duration) -> Self {
        Self {
            profiler: FrameProfiler::new(),
            log_interval,
            last_log: Instant::now(),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        self.profiler.fps()
    }
}

impl Default for HeadlessRender {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl RenderSink for HeadlessRender {
    fn show(&mut self, _frame: &CameraFrame) {
        self.profiler.begin_frame();
        self.frames += 1;

        if self.last_log.elapsed() >= self.log_interval {
            self.last_log = Instant::now();
            log::info!("Preview: {:.1} fps ({} frames)", self.profiler.fps(), self.frames);
        }
    }
}

/// Writes every Nth preview frame to a directory as PNG
pub struct FrameDumper {
    dir: PathBuf,
    every: u64,
    seen: u64,
    written: u64,
}

impl FrameDumper {
    pub fn new(dir: &Path, every: u64) -> Result<Self, CaptureError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            every: every.max(1),
            seen: 0,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn write(&self, frame: &CameraFrame) -> Result<(), String> {
        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| "frame buffer size mismatch".to_string())?;
        let path = self.dir.join(format!("frame_{:06}.png", frame.frame_number));
        image.save(&path).map_err(|e| format!("{:?}: {}", path, e))
    }
}

impl RenderSink for FrameDumper {
    fn show(&mut self, frame: &CameraFrame) {
        let due = self.seen % self.every == 0;
        self.seen += 1;
        if !due {
            return;
        }
        match self.write(frame) {
            Ok(()) => self.written += 1,
            Err(e) => log::warn!("Failed to dump frame: {}", e),
        }
    }
}

/// Fan a frame out to several sinks
impl RenderSink for Vec<Box<dyn RenderSink>> {
    fn show(&mut self, frame: &CameraFrame) {
        for sink in self.iter_mut() {
            sink.show(frame);
        }
    }
}
