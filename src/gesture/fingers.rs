//! Finger extension classifier

use std::fmt;

use crate::landmarks::{
    Handedness, LandmarkPoint, FINGERTIPS, LANDMARK_COUNT, THUMB_IP, THUMB_TIP,
};

/// Thumb polarity used when the detector gives no handedness label.
pub const UNKNOWN_HANDEDNESS_POLARITY: Handedness = Handedness::Right;

/// Extended/folded flag per finger: thumb, index, middle, ring, pinky
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub const FOLDED: FingerState = FingerState([false; 5]);

    /// Build from 0/1 flags, e.g. `FingerState::from_bits([0, 1, 1, 0, 0])`
    pub const fn from_bits(bits: [u8; 5]) -> Self {
        FingerState([
            bits[0] != 0,
            bits[1] != 0,
            bits[2] != 0,
            bits[3] != 0,
            bits[4] != 0,
        ])
    }

    pub fn thumb(&self) -> bool {
        self.0[0]
    }

    pub fn index(&self) -> bool {
        self.0[1]
    }

    pub fn middle(&self) -> bool {
        self.0[2]
    }

    pub fn ring(&self) -> bool {
        self.0[3]
    }

    pub fn pinky(&self) -> bool {
        self.0[4]
    }

    pub fn extended_count(&self) -> usize {
        self.0.iter().filter(|&&f| f).count()
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &extended in &self.0 {
            f.write_str(if extended { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Classify which fingers are extended.
///
/// Fewer than 21 landmarks yields [`FingerState::FOLDED`]. `Unknown`
/// handedness uses [`UNKNOWN_HANDEDNESS_POLARITY`].
pub fn classify_fingers(landmarks: &[LandmarkPoint], handedness: Handedness) -> FingerState {
    if landmarks.len() < LANDMARK_COUNT {
        return FingerState::FOLDED;
    }

    let mut fingers = [false; 5];

    // Thumb tip moves sideways, and which way depends on the hand
    let tip = landmarks[THUMB_TIP].x;
    let ip = landmarks[THUMB_IP].x;
    fingers[0] = match handedness.resolve(UNKNOWN_HANDEDNESS_POLARITY) {
        Handedness::Left => tip < ip,
        _ => tip > ip,
    };

    // Other fingers: tip above its PIP joint (smaller y is higher)
    for (i, &tip) in FINGERTIPS.iter().enumerate().skip(1) {
        fingers[i] = landmarks[tip].y < landmarks[tip - 2].y;
    }

    FingerState(fingers)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open hand with every tip above its PIP, thumb tip right of the IP joint
    fn open_hand() -> Vec<LandmarkPoint> {
        let mut points = vec![LandmarkPoint::new(0.5, 0.8); 21];
        points[THUMB_IP] = LandmarkPoint::new(0.5, 0.6);
        points[THUMB_TIP] = LandmarkPoint::new(0.6, 0.6);
        for &tip in &FINGERTIPS[1..] {
            points[tip - 2] = LandmarkPoint::new(0.5, 0.5);
            points[tip] = LandmarkPoint::new(0.5, 0.3);
        }
        points
    }

    #[test]
    fn test_thumb_polarity() {
        let points = open_hand();
        assert!(classify_fingers(&points, Handedness::Right).thumb());
        assert!(!classify_fingers(&points, Handedness::Left).thumb());
    }

    #[test]
    fn test_unknown_handedness_uses_right_polarity() {
        let points = open_hand();
        assert_eq!(
            classify_fingers(&points, Handedness::Unknown),
            classify_fingers(&points, Handedness::Right)
        );
    }

    #[test]
    fn test_open_hand() {
        let state = classify_fingers(&open_hand(), Handedness::Right);
        assert_eq!(state, FingerState::from_bits([1, 1, 1, 1, 1]));
        assert_eq!(state.extended_count(), 5);
    }

    #[test]
    fn test_folded_finger() {
        let mut points = open_hand();
        // Middle tip drops below its PIP
        points[12] = LandmarkPoint::new(0.5, 0.7);
        let state = classify_fingers(&points, Handedness::Right);
        assert!(!state.middle());
        assert!(state.index() && state.ring() && state.pinky());
    }

    #[test]
    fn test_equal_y_counts_as_folded() {
        let mut points = open_hand();
        points[8] = points[6];
        assert!(!classify_fingers(&points, Handedness::Right).index());
    }

    #[test]
    fn test_too_few_landmarks() {
        let points = open_hand();
        assert_eq!(classify_fingers(&points[..20], Handedness::Right), FingerState::FOLDED);
        assert_eq!(classify_fingers(&[], Handedness::Left), FingerState::FOLDED);
    }

    #[test]
    fn test_display() {
        assert_eq!(FingerState::from_bits([0, 1, 1, 0, 0]).to_string(), "01100");
    }
}
