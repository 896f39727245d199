//! Gesture interpretation
//!
//! Finger-state classification, camera-to-screen remapping, and the
//! stateful mapper that turns both into pointer commands.

pub mod fingers;
pub mod mapper;
pub mod remap;

pub use fingers::{classify_fingers, FingerState, UNKNOWN_HANDEDNESS_POLARITY};
pub use mapper::{CursorSmoothingState, Gesture, GestureMapper, DEFAULT_SMOOTH_ALPHA};
pub use remap::{remap, ScreenMapper};
