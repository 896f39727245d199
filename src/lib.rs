//! Virtual Touch - touch-free pointer control from hand gestures
//!
//! Camera frames go to an asynchronous hand-landmark detector. Each result is
//! classified into a finger pattern, mapped to pointer move/click/drag/scroll
//! commands, and published as the latest landmark snapshot for the preview.

pub mod app;
pub mod camera;
pub mod config;
pub mod detection;
pub mod error;
pub mod gesture;
pub mod landmarks;
pub mod pointer;
pub mod render;
pub mod snapshot;
pub mod telemetry;

pub use app::VirtualTouchApp;
pub use config::AppConfig;
pub use detection::{DetectionBridge, DetectionWorker, ResultHandler};
pub use gesture::{FingerState, Gesture, GestureMapper, ScreenMapper};
pub use landmarks::{HandDetection, Handedness, LandmarkPoint};
pub use pointer::{PointerButton, PointerCommand, PointerSink, ScreenSize};
pub use snapshot::{Snapshot, SnapshotStore};
