//! Hand landmark types
//!
//! Normalized 2-D keypoints as delivered by the hand-landmark detector,
//! indexed with the usual 21-point hand topology.

use serde::{Deserialize, Serialize};

/// Number of landmarks in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// Fingertip indices (thumb, index, middle, ring, pinky)
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Hand landmark (normalized to the source frame, 0.0..=1.0)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position in pixels for a frame of the given size
    pub fn to_pixels(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

impl From<[f32; 2]> for LandmarkPoint {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// Which hand the detector believes it saw
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    /// Parse a detector category label ("Left" / "Right", any case)
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Handedness::Left,
            "right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }

    /// Resolve `Unknown` to a concrete hand
    pub fn resolve(self, fallback: Handedness) -> Handedness {
        match self {
            Handedness::Unknown => fallback,
            known => known,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
            Handedness::Unknown => "unknown",
        }
    }
}

/// One tracked hand from a detection result
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub landmarks: Vec<LandmarkPoint>,
    #[serde(default)]
    pub handedness: Handedness,
}

impl HandDetection {
    pub fn new(landmarks: Vec<LandmarkPoint>, handedness: Handedness) -> Self {
        Self { landmarks, handedness }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handedness_labels() {
        assert_eq!(Handedness::from_label("Left"), Handedness::Left);
        assert_eq!(Handedness::from_label(" right "), Handedness::Right);
        assert_eq!(Handedness::from_label("ambidextrous"), Handedness::Unknown);
    }

    #[test]
    fn test_handedness_resolve() {
        assert_eq!(Handedness::Unknown.resolve(Handedness::Right), Handedness::Right);
        assert_eq!(Handedness::Left.resolve(Handedness::Right), Handedness::Left);
    }

    #[test]
    fn test_to_pixels() {
        let p = LandmarkPoint::new(0.5, 0.25);
        assert_eq!(p.to_pixels(640, 480), (320.0, 120.0));
    }
}
