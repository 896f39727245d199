//! Pointer sink whose backend lives on its own thread
//!
//! Input-injection handles are tied to the thread that created them. The
//! backend is built and driven on a dedicated thread; the handle kept by
//! the gesture pipeline only holds a channel sender.

use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::error::PointerError;

use super::{PointerButton, PointerCommand, PointerSink, ScreenSize};

/// Forwards commands to a backend running on a dedicated thread
pub struct ThreadedSink {
    /// Channel to the backend thread
    command_sender: Option<Sender<PointerCommand>>,
    /// Display size the backend reported at startup
    screen: Option<ScreenSize>,
    /// Backend thread handle
    thread_handle: Option<JoinHandle<()>>,
}

impl ThreadedSink {
    /// Spawn a thread named `name`, build the backend there with `factory`
    /// and wait until it is ready.
    pub fn spawn<S, F>(name: &str, factory: F) -> Result<Self, PointerError>
    where
        S: PointerSink + 'static,
        F: FnOnce() -> Result<S, PointerError> + Send + 'static,
    {
        let (command_sender, command_receiver) = crossbeam_channel::unbounded::<PointerCommand>();
        let (ready_sender, ready_receiver) = crossbeam_channel::bounded(1);

        let thread_handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let sink = match factory() {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_sender.send(Err(e));
                        return;
                    }
                };
                if ready_sender.send(Ok(sink.screen_size())).is_ok() {
                    Self::backend_thread(sink, command_receiver);
                }
            })
            .map_err(|e| PointerError::Init(format!("failed to spawn pointer thread: {}", e)))?;

        let screen = match ready_receiver.recv() {
            Ok(Ok(screen)) => screen,
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread_handle.join();
                return Err(PointerError::Init("pointer thread exited during startup".into()));
            }
        };

        Ok(Self {
            command_sender: Some(command_sender),
            screen,
            thread_handle: Some(thread_handle),
        })
    }

    /// Backend thread main loop; ends once the sender is dropped
    fn backend_thread<S: PointerSink>(mut sink: S, command_receiver: Receiver<PointerCommand>) {
        log::debug!("Pointer thread started");
        while let Ok(command) = command_receiver.recv() {
            sink.apply(command);
        }
        log::debug!("Pointer thread stopped");
    }

    fn send(&self, command: PointerCommand) {
        let Some(ref sender) = self.command_sender else {
            return;
        };
        if sender.send(command).is_err() {
            log::warn!("Pointer thread gone, dropped {:?}", command);
        }
    }
}

impl PointerSink for ThreadedSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.send(PointerCommand::Move { x, y });
    }

    fn press(&mut self, button: PointerButton) {
        self.send(PointerCommand::Press(button));
    }

    fn release(&mut self, button: PointerButton) {
        self.send(PointerCommand::Release(button));
    }

    fn click(&mut self, button: PointerButton) {
        self.send(PointerCommand::Click(button));
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }
}

impl Drop for ThreadedSink {
    fn drop(&mut self) {
        // Queued commands (a final release included) run before the join returns
        self.command_sender = None;
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Pointer thread panicked");
            }
        }
    }
}
