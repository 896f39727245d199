//! OS pointer injection through enigo

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Mouse, Settings};

use crate::error::PointerError;

use super::{PointerButton, PointerSink, ScreenSize, ThreadedSink};

/// Drives the real system pointer.
///
/// `Enigo` is not `Send`; use [`EnigoSink::spawn`] to own it on a
/// dedicated `pointer` thread.
pub struct EnigoSink {
    enigo: Enigo,
    screen: Option<ScreenSize>,
}

impl EnigoSink {
    /// Create the sink on a dedicated thread and return a handle to it
    pub fn spawn() -> Result<ThreadedSink, PointerError> {
        ThreadedSink::spawn("pointer", Self::new)
    }

    /// Connect on the calling thread. The sink must stay on this thread.
    pub fn new() -> Result<Self, PointerError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PointerError::Init(format!("{:?}", e)))?;

        let screen = match enigo.main_display() {
            Ok((w, h)) if w > 0 && h > 0 => Some(ScreenSize::new(w as u32, h as u32)),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not query display size: {:?}", e);
                None
            }
        };
        if let Some(screen) = screen {
            log::info!("Pointer sink attached to {} display", screen);
        }

        Ok(Self { enigo, screen })
    }

    fn to_enigo(button: PointerButton) -> Button {
        match button {
            PointerButton::Left => Button::Left,
            PointerButton::Right => Button::Right,
            PointerButton::ScrollUp => Button::ScrollUp,
            PointerButton::ScrollDown => Button::ScrollDown,
        }
    }

    fn button(&mut self, button: PointerButton, direction: Direction) {
        if let Err(e) = self.enigo.button(Self::to_enigo(button), direction) {
            log::warn!("Pointer button {:?} {:?} failed: {:?}", button, direction, e);
        }
    }

    fn scroll(&mut self, notches: i32) {
        if let Err(e) = self.enigo.scroll(notches, Axis::Vertical) {
            log::warn!("Scroll failed: {:?}", e);
        }
    }
}

impl PointerSink for EnigoSink {
    fn move_to(&mut self, x: f32, y: f32) {
        if let Err(e) = self
            .enigo
            .move_mouse(x.round() as i32, y.round() as i32, Coordinate::Abs)
        {
            log::warn!("Pointer move failed: {:?}", e);
        }
    }

    fn press(&mut self, button: PointerButton) {
        self.button(button, Direction::Press);
    }

    fn release(&mut self, button: PointerButton) {
        self.button(button, Direction::Release);
    }

    fn click(&mut self, button: PointerButton) {
        // Wheel "buttons" become one scroll notch; positive scrolls down
        match button {
            PointerButton::ScrollUp => self.scroll(-1),
            PointerButton::ScrollDown => self.scroll(1),
            _ => self.button(button, Direction::Click),
        }
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }
}
