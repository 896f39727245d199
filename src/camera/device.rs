//! Live webcam capture using nokhwa

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::error::CaptureError;

use super::{CameraFrame, CaptureSource};

/// Consecutive capture failures tolerated before the stream is treated as ended
const MAX_CONSECUTIVE_FAILURES: u32 = 50;

/// Blocking webcam source
pub struct DeviceCamera {
    camera: Camera,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl DeviceCamera {
    /// Open camera `index`, asking for `width`x`height` at `fps`.
    ///
    /// Falls back to the best frame rate at that size, then the highest
    /// resolution the device offers, then whatever format it picks.
    pub fn open(index: u32, width: u32, height: u32, fps: u32) -> Result<Self, CaptureError> {
        let camera_index = CameraIndex::Index(index);
        let resolution = Resolution::new(width, height);
        let attempts = [
            RequestedFormatType::Closest(CameraFormat::new(resolution, FrameFormat::MJPEG, fps)),
            RequestedFormatType::HighestResolution(resolution),
            RequestedFormatType::AbsoluteHighestResolution,
            RequestedFormatType::None,
        ];

        let mut last_error = String::new();
        let mut opened = None;
        for format_type in attempts {
            let label = format!("{:?}", format_type);
            let requested = RequestedFormat::new::<RgbAFormat>(format_type);
            match Camera::new(camera_index.clone(), requested) {
                Ok(camera) => {
                    opened = Some(camera);
                    break;
                }
                Err(e) => {
                    log::warn!("Camera {} rejected {}: {:?}", index, label, e);
                    last_error = e.to_string();
                }
            }
        }

        let mut camera = opened.ok_or(CaptureError::Open {
            index,
            reason: last_error,
        })?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        log::info!(
            "Camera opened: {} ({}x{} @ {} fps)",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            width,
            height,
            frame_count: 0,
        })
    }

    fn capture(&mut self) -> Result<CameraFrame, String> {
        let buffer = self.camera.frame().map_err(|e| e.to_string())?;
        let image = buffer
            .decode_image::<RgbAFormat>()
            .map_err(|e| e.to_string())?;
        let (src_w, src_h) = (image.width(), image.height());

        let mut frame = CameraFrame::new(image.into_raw(), src_w, src_h, self.frame_count);
        if (src_w, src_h) != (self.width, self.height) {
            // Landmark-to-pixel math assumes the configured size
            frame.data = frame.downscale(self.width, self.height);
            frame.width = self.width;
            frame.height = self.height;
        }
        self.frame_count += 1;
        Ok(frame)
    }
}

impl CaptureSource for DeviceCamera {
    fn next_frame(&mut self) -> Option<CameraFrame> {
        let mut failures = 0;
        loop {
            match self.capture() {
                Ok(frame) => return Some(frame),
                Err(e) => {
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        log::error!("Camera stream failed {} times in a row: {}", failures, e);
                        return None;
                    }
                    log::warn!("Failed to capture frame: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for DeviceCamera {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {:?}", e);
        }
    }
}

/// Names of the cameras the OS reports
pub fn list_cameras() -> Vec<String> {
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(cameras) => cameras.iter().map(|c| c.human_name().to_string()).collect(),
        Err(e) => {
            log::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}
