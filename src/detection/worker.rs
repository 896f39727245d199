//! Threaded detection engine
//!
//! Runs a [`LandmarkModel`] on a dedicated thread fed by a bounded channel.
//! The capture loop never waits: when the queue is full the frame is dropped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::camera::CameraFrame;
use crate::error::DetectionError;

use super::{DetectionEngine, DetectionResult, LandmarkModel, ResultCallback};

/// Frame queued for detection
struct DetectionJob {
    frame: CameraFrame,
    timestamp_ms: u64,
}

/// Detection engine backed by a worker thread
pub struct DetectionWorker {
    /// Channel to send frames to the worker thread
    frame_sender: Option<Sender<DetectionJob>>,
    /// Frames accepted but not yet delivered
    in_flight: Arc<AtomicUsize>,
    /// Whether the worker thread is alive
    running: Arc<AtomicBool>,
    /// Worker thread handle
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl DetectionWorker {
    /// Start the worker.
    ///
    /// `queue_depth` bounds how many frames may wait for the model;
    /// `callback` runs on the worker thread once per accepted frame.
    pub fn spawn<M: LandmarkModel>(
        model: M,
        queue_depth: usize,
        callback: ResultCallback,
    ) -> Result<Self, DetectionError> {
        let (frame_sender, frame_receiver) = crossbeam_channel::bounded::<DetectionJob>(queue_depth.max(1));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(true));

        let in_flight_clone = in_flight.clone();
        let running_clone = running.clone();

        let thread_handle = std::thread::Builder::new()
            .name("hand-detection".to_string())
            .spawn(move || {
                Self::worker_thread(model, frame_receiver, callback, in_flight_clone);
                running_clone.store(false, Ordering::Release);
            })
            .map_err(DetectionError::Spawn)?;

        Ok(Self {
            frame_sender: Some(frame_sender),
            in_flight,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    /// Worker thread main loop
    fn worker_thread<M: LandmarkModel>(
        mut model: M,
        frame_receiver: Receiver<DetectionJob>,
        mut callback: ResultCallback,
        in_flight: Arc<AtomicUsize>,
    ) {
        log::info!("Detection worker started ({})", model.name());

        // Ends once the sender is dropped and the queue is drained
        while let Ok(job) = frame_receiver.recv() {
            let outcome = model.detect(&job.frame);
            callback(DetectionResult {
                timestamp_ms: job.timestamp_ms,
                frame_number: job.frame.frame_number,
                outcome,
            });
            in_flight.fetch_sub(1, Ordering::AcqRel);
        }

        log::info!("Detection worker stopped");
    }

    /// Frames accepted whose results have not been delivered yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl DetectionEngine for DetectionWorker {
    fn submit(&self, frame: CameraFrame, timestamp_ms: u64) -> bool {
        let Some(ref sender) = self.frame_sender else {
            return false;
        };

        // Count first so the worker can never decrement below zero
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        match sender.try_send(DetectionJob { frame, timestamp_ms }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                false
            }
        }
    }

    fn shutdown(&mut self) {
        // Drop sender to signal the thread to finish the queue and stop
        self.frame_sender = None;

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Detection worker panicked");
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
