//! Gesture-to-pointer state machine
//!
//! Turns one finger-state vector plus the index fingertip into the pointer
//! commands for that frame, keeping a smoothed cursor position and the
//! drag (left button held) flag across frames.

use crate::landmarks::{Handedness, LandmarkPoint, INDEX_TIP};
use crate::pointer::{PointerButton, PointerCommand};

use super::fingers::{classify_fingers, FingerState};
use super::remap::ScreenMapper;

/// Default exponential smoothing factor
pub const DEFAULT_SMOOTH_ALPHA: f32 = 0.2;

/// Gestures the mapper understands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// Index + middle extended: hold left button and move
    Drag,
    /// Thumb only
    LeftClick,
    /// Thumb + index + pinky
    RightClick,
    /// Index only
    Move,
    /// Fist
    ScrollDown,
    /// Pinky only
    ScrollUp,
    /// Anything else
    #[default]
    None,
}

impl Gesture {
    /// Classify a finger-state vector. Patterns are disjoint.
    pub fn classify(fingers: FingerState) -> Gesture {
        match fingers.0 {
            [false, true, true, false, false] => Gesture::Drag,
            [true, false, false, false, false] => Gesture::LeftClick,
            [true, true, false, false, true] => Gesture::RightClick,
            [false, true, false, false, false] => Gesture::Move,
            [false, false, false, false, false] => Gesture::ScrollDown,
            [false, false, false, false, true] => Gesture::ScrollUp,
            _ => Gesture::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Drag => "drag",
            Gesture::LeftClick => "left-click",
            Gesture::RightClick => "right-click",
            Gesture::Move => "move",
            Gesture::ScrollDown => "scroll-down",
            Gesture::ScrollUp => "scroll-up",
            Gesture::None => "none",
        }
    }
}

/// Smoothed cursor and drag flag carried between frames
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorSmoothingState {
    pub x: f32,
    pub y: f32,
    pub drag_held: bool,
}

impl CursorSmoothingState {
    /// One low-pass step from the previous smoothed position toward `target`
    pub fn smoothed_toward(&self, target: (f32, f32), alpha: f32) -> (f32, f32) {
        (
            self.x + (target.0 - self.x) * alpha,
            self.y + (target.1 - self.y) * alpha,
        )
    }
}

/// Stateful gesture mapper.
///
/// Lives inside the detection completion handler; only that context
/// touches it.
pub struct GestureMapper {
    screen: ScreenMapper,
    alpha: f32,
    unknown_handedness: Handedness,
    state: CursorSmoothingState,
    last_gesture: Gesture,
}

impl GestureMapper {
    pub fn new(screen: ScreenMapper) -> Self {
        Self {
            screen,
            alpha: DEFAULT_SMOOTH_ALPHA,
            unknown_handedness: Handedness::Right,
            state: CursorSmoothingState::default(),
            last_gesture: Gesture::None,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Thumb polarity for hands the detector could not label
    pub fn with_unknown_handedness(mut self, handedness: Handedness) -> Self {
        self.unknown_handedness = handedness;
        self
    }

    pub fn state(&self) -> CursorSmoothingState {
        self.state
    }

    pub fn last_gesture(&self) -> Gesture {
        self.last_gesture
    }

    /// Process one detected hand.
    ///
    /// Returns no commands (and leaves state untouched) when the index
    /// fingertip is missing.
    pub fn process(&mut self, landmarks: &[LandmarkPoint], handedness: Handedness) -> Vec<PointerCommand> {
        let Some(&tip) = landmarks.get(INDEX_TIP) else {
            return Vec::new();
        };
        let fingers = classify_fingers(landmarks, handedness.resolve(self.unknown_handedness));
        self.step(fingers, tip)
    }

    /// Advance the state machine by one frame
    pub fn step(&mut self, fingers: FingerState, index_tip: LandmarkPoint) -> Vec<PointerCommand> {
        let target = self.screen.map(index_tip);
        let (x, y) = self.state.smoothed_toward(target, self.alpha);

        let gesture = Gesture::classify(fingers);
        let mut commands = Vec::with_capacity(2);

        if gesture == Gesture::Drag {
            if !self.state.drag_held {
                commands.push(PointerCommand::Press(PointerButton::Left));
                self.state.drag_held = true;
            }
            commands.push(PointerCommand::Move { x, y });
        } else {
            if self.state.drag_held {
                commands.push(PointerCommand::Release(PointerButton::Left));
                self.state.drag_held = false;
            }
            match gesture {
                Gesture::LeftClick => commands.push(PointerCommand::Click(PointerButton::Left)),
                Gesture::RightClick => commands.push(PointerCommand::Click(PointerButton::Right)),
                Gesture::Move => commands.push(PointerCommand::Move { x, y }),
                Gesture::ScrollDown => commands.push(PointerCommand::Click(PointerButton::ScrollDown)),
                Gesture::ScrollUp => commands.push(PointerCommand::Click(PointerButton::ScrollUp)),
                Gesture::Drag | Gesture::None => {}
            }
        }

        // Advanced on every frame so a gesture change never jumps the cursor
        self.state.x = x;
        self.state.y = y;

        if gesture != self.last_gesture {
            tracing::debug!(
                from = self.last_gesture.as_str(),
                to = gesture.as_str(),
                fingers = %fingers,
                "gesture changed"
            );
            self.last_gesture = gesture;
        }

        commands
    }

    /// Commands needed to leave the pointer in a neutral state (button up)
    pub fn release_all(&mut self) -> Vec<PointerCommand> {
        if self.state.drag_held {
            self.state.drag_held = false;
            vec![PointerCommand::Release(PointerButton::Left)]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::ScreenSize;

    const DRAG: FingerState = FingerState::from_bits([0, 1, 1, 0, 0]);
    const POINT: FingerState = FingerState::from_bits([0, 1, 0, 0, 0]);
    const FIST: FingerState = FingerState::from_bits([0, 0, 0, 0, 0]);

    fn mapper() -> GestureMapper {
        GestureMapper::new(ScreenMapper::new(640, 480, 170.0, ScreenSize::new(1920, 1080)))
    }

    fn center() -> LandmarkPoint {
        LandmarkPoint::new(0.5, 0.5)
    }

    fn count(commands: &[PointerCommand], wanted: PointerCommand) -> usize {
        commands.iter().filter(|&&c| c == wanted).count()
    }

    #[test]
    fn test_classify_enumerated_patterns() {
        let cases = [
            ([0, 1, 1, 0, 0], Gesture::Drag),
            ([1, 0, 0, 0, 0], Gesture::LeftClick),
            ([1, 1, 0, 0, 1], Gesture::RightClick),
            ([0, 1, 0, 0, 0], Gesture::Move),
            ([0, 0, 0, 0, 0], Gesture::ScrollDown),
            ([0, 0, 0, 0, 1], Gesture::ScrollUp),
        ];
        for (bits, gesture) in cases {
            assert_eq!(Gesture::classify(FingerState::from_bits(bits)), gesture);
        }
    }

    #[test]
    fn test_other_patterns_are_noop() {
        let mut known = 0;
        for n in 0u8..32 {
            let bits = [n & 1, (n >> 1) & 1, (n >> 2) & 1, (n >> 3) & 1, (n >> 4) & 1];
            let fingers = FingerState::from_bits(bits);
            let gesture = Gesture::classify(fingers);
            if gesture == Gesture::None {
                let mut m = mapper();
                assert!(m.step(fingers, center()).is_empty(), "pattern {}", fingers);
            } else {
                known += 1;
            }
        }
        assert_eq!(known, 6);
    }

    #[test]
    fn test_drag_press_is_idempotent() {
        let mut m = mapper();
        let mut all = Vec::new();
        for _ in 0..5 {
            all.extend(m.step(DRAG, center()));
        }
        assert_eq!(count(&all, PointerCommand::Press(PointerButton::Left)), 1);
        assert_eq!(all.iter().filter(|c| matches!(c, PointerCommand::Move { .. })).count(), 5);
        assert!(m.state().drag_held);
    }

    #[test]
    fn test_drag_release_precedes_next_action() {
        let mut m = mapper();
        m.step(DRAG, center());
        m.step(DRAG, center());

        let commands = m.step(FingerState::from_bits([1, 0, 0, 0, 0]), center());
        assert_eq!(
            commands,
            vec![
                PointerCommand::Release(PointerButton::Left),
                PointerCommand::Click(PointerButton::Left),
            ]
        );
        assert!(!m.state().drag_held);

        // No second release
        let commands = m.step(FIST, center());
        assert_eq!(commands, vec![PointerCommand::Click(PointerButton::ScrollDown)]);
    }

    #[test]
    fn test_smoothing_convergence() {
        let mut state = CursorSmoothingState::default();
        for _ in 0..10 {
            let (x, y) = state.smoothed_toward((100.0, 100.0), 0.2);
            state.x = x;
            state.y = y;
        }
        let expected = 100.0 * (1.0 - 0.8f32.powi(10));
        assert!((state.x - expected).abs() < 1e-3);
        assert!((state.x - 89.26).abs() < 0.01);
    }

    #[test]
    fn test_move_uses_previous_smoothed_value() {
        let mut m = mapper();
        let first = m.step(POINT, center());
        assert_eq!(first.len(), 1);
        assert!(matches!(
            first[0],
            PointerCommand::Move { x, y } if (x - 192.0).abs() < 1e-3 && (y - 108.0).abs() < 1e-3
        ));

        let second = m.step(POINT, center());
        let PointerCommand::Move { x, y } = second[0] else {
            panic!("expected move, got {:?}", second);
        };
        assert!((x - (192.0 + (960.0 - 192.0) * 0.2)).abs() < 1e-3);
        assert!((y - (108.0 + (540.0 - 108.0) * 0.2)).abs() < 1e-3);
    }

    #[test]
    fn test_fist_frames_click_and_keep_smoothing() {
        let mut m = mapper();
        let a = m.step(FIST, center());
        let b = m.step(FIST, center());

        assert_eq!(a, vec![PointerCommand::Click(PointerButton::ScrollDown)]);
        assert_eq!(b, vec![PointerCommand::Click(PointerButton::ScrollDown)]);

        // Two steps toward (960, 540) from the origin
        let expected_x = 960.0 * (1.0 - 0.8f32.powi(2));
        assert!((m.state().x - expected_x).abs() < 1e-3);

        // Pointing resumes from that baseline rather than from zero
        let c = m.step(POINT, center());
        let expected_x = 960.0 * (1.0 - 0.8f32.powi(3));
        assert!(matches!(c[0], PointerCommand::Move { x, .. } if (x - expected_x).abs() < 1e-3));
    }

    #[test]
    fn test_right_click_and_scroll_up() {
        let mut m = mapper();
        assert_eq!(
            m.step(FingerState::from_bits([1, 1, 0, 0, 1]), center()),
            vec![PointerCommand::Click(PointerButton::Right)]
        );
        assert_eq!(
            m.step(FingerState::from_bits([0, 0, 0, 0, 1]), center()),
            vec![PointerCommand::Click(PointerButton::ScrollUp)]
        );
    }

    #[test]
    fn test_process_ignores_missing_index_tip() {
        let mut m = mapper();
        let points = vec![LandmarkPoint::new(0.5, 0.5); 8];
        assert!(m.process(&points, Handedness::Right).is_empty());
        assert_eq!(m.state(), CursorSmoothingState::default());
    }

    #[test]
    fn test_process_partial_hand_reads_as_fist() {
        let mut m = mapper();
        let points = vec![LandmarkPoint::new(0.5, 0.5); 12];
        assert_eq!(
            m.process(&points, Handedness::Right),
            vec![PointerCommand::Click(PointerButton::ScrollDown)]
        );
    }

    #[test]
    fn test_release_all() {
        let mut m = mapper();
        m.step(DRAG, center());
        assert_eq!(m.release_all(), vec![PointerCommand::Release(PointerButton::Left)]);
        assert!(m.release_all().is_empty());
    }
}
