//! Hand landmark detection
//!
//! The detector runs in its own execution context: frames go in through
//! [`DetectionEngine::submit`] without blocking, and results come back later
//! through a registered completion callback. [`DetectionBridge`] and
//! [`ResultHandler`] connect that callback to the gesture mapper, the pointer
//! sink and the snapshot store.

pub mod bridge;
pub mod scripted;
pub mod worker;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use bridge::{DetectionBridge, DetectionStats, FrameClock, ResultHandler};
pub use scripted::ScriptedModel;
pub use worker::DetectionWorker;

#[cfg(feature = "onnx")]
pub use onnx::OnnxHandLandmarker;

use crate::camera::CameraFrame;
use crate::error::DetectionError;
use crate::landmarks::HandDetection;

/// Result for one submitted frame
#[derive(Debug)]
pub struct DetectionResult {
    /// Timestamp the frame was submitted with
    pub timestamp_ms: u64,
    /// Frame number of the source frame
    pub frame_number: u64,
    /// Detected hands (possibly none), or the engine's failure status
    pub outcome: Result<Vec<HandDetection>, DetectionError>,
}

/// Completion handler invoked by the engine once per accepted frame
pub type ResultCallback = Box<dyn FnMut(DetectionResult) + Send + 'static>;

/// Synchronous hand-landmark model
pub trait LandmarkModel: Send + 'static {
    fn detect(&mut self, frame: &CameraFrame) -> Result<Vec<HandDetection>, DetectionError>;

    fn name(&self) -> &str {
        "landmark-model"
    }
}

impl<M: LandmarkModel + ?Sized> LandmarkModel for Box<M> {
    fn detect(&mut self, frame: &CameraFrame) -> Result<Vec<HandDetection>, DetectionError> {
        (**self).detect(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Asynchronous detection engine
pub trait DetectionEngine {
    /// Queue a frame without blocking.
    ///
    /// Returns `false` if the engine is saturated or stopped; the frame is
    /// dropped and no result will be delivered for it.
    fn submit(&self, frame: CameraFrame, timestamp_ms: u64) -> bool;

    /// Stop accepting frames and wait until every accepted frame's result has
    /// been delivered.
    fn shutdown(&mut self);
}
