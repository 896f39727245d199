//! Pointer command model and output sinks
//!
//! The gesture mapper produces [`PointerCommand`]s; a [`PointerSink`]
//! turns them into real (or recorded) pointer activity.

#[cfg(feature = "enigo")]
pub mod enigo_sink;
pub mod threaded;

#[cfg(feature = "enigo")]
pub use enigo_sink::EnigoSink;
pub use threaded::ThreadedSink;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Screen size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pointer buttons, numbered as X11 numbers them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Left,
    Right,
    ScrollUp,
    ScrollDown,
}

impl PointerButton {
    /// X11 button number
    pub fn code(&self) -> u32 {
        match self {
            PointerButton::Left => 1,
            PointerButton::Right => 3,
            PointerButton::ScrollUp => 4,
            PointerButton::ScrollDown => 5,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(PointerButton::Left),
            3 => Some(PointerButton::Right),
            4 => Some(PointerButton::ScrollUp),
            5 => Some(PointerButton::ScrollDown),
            _ => None,
        }
    }
}

/// One pointer action in absolute screen coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PointerCommand {
    Move { x: f32, y: f32 },
    Press(PointerButton),
    Release(PointerButton),
    Click(PointerButton),
}

/// Destination for pointer commands.
///
/// Calls are fire-and-forget: implementations log failures instead of
/// returning them. Backends that must stay on one thread run behind a
/// [`ThreadedSink`].
pub trait PointerSink {
    fn move_to(&mut self, x: f32, y: f32);

    fn press(&mut self, button: PointerButton);

    fn release(&mut self, button: PointerButton);

    fn click(&mut self, button: PointerButton) {
        self.press(button);
        self.release(button);
    }

    /// Size of the display this sink drives, if it knows
    fn screen_size(&self) -> Option<ScreenSize> {
        None
    }

    fn apply(&mut self, command: PointerCommand) {
        match command {
            PointerCommand::Move { x, y } => self.move_to(x, y),
            PointerCommand::Press(button) => self.press(button),
            PointerCommand::Release(button) => self.release(button),
            PointerCommand::Click(button) => self.click(button),
        }
    }
}

impl<S: PointerSink + ?Sized> PointerSink for Box<S> {
    fn move_to(&mut self, x: f32, y: f32) {
        (**self).move_to(x, y)
    }

    fn press(&mut self, button: PointerButton) {
        (**self).press(button)
    }

    fn release(&mut self, button: PointerButton) {
        (**self).release(button)
    }

    fn click(&mut self, button: PointerButton) {
        (**self).click(button)
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        (**self).screen_size()
    }
}

/// Sink that records every command; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingSink {
    commands: Arc<Mutex<Vec<PointerCommand>>>,
    screen: Option<ScreenSize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(screen: ScreenSize) -> Self {
        Self {
            commands: Arc::default(),
            screen: Some(screen),
        }
    }

    /// Copy of everything recorded so far
    pub fn commands(&self) -> Vec<PointerCommand> {
        self.commands.lock().clone()
    }

    /// Drain the recorded commands
    pub fn take(&self) -> Vec<PointerCommand> {
        std::mem::take(&mut *self.commands.lock())
    }
}

impl PointerSink for RecordingSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.lock().push(PointerCommand::Move { x, y });
    }

    fn press(&mut self, button: PointerButton) {
        self.commands.lock().push(PointerCommand::Press(button));
    }

    fn release(&mut self, button: PointerButton) {
        self.commands.lock().push(PointerCommand::Release(button));
    }

    // Recorded as a single command rather than press + release
    fn click(&mut self, button: PointerButton) {
        self.commands.lock().push(PointerCommand::Click(button));
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }
}

/// Dry-run sink: logs commands instead of moving the pointer
#[derive(Default)]
pub struct LogSink {
    screen: Option<ScreenSize>,
    moves: u64,
}

impl LogSink {
    pub fn new(screen: Option<ScreenSize>) -> Self {
        Self { screen, moves: 0 }
    }
}

impl PointerSink for LogSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.moves += 1;
        // Moves arrive every frame; keep them out of the info log
        log::trace!("move to ({:.1}, {:.1})", x, y);
    }

    fn press(&mut self, button: PointerButton) {
        log::info!("press {:?} (button {})", button, button.code());
    }

    fn release(&mut self, button: PointerButton) {
        log::info!("release {:?} (button {})", button, button.code());
    }

    fn click(&mut self, button: PointerButton) {
        log::info!("click {:?} (button {})", button, button.code());
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        log::debug!("dry-run sink saw {} moves", self.moves);
    }
}
