//! Latest-landmark snapshot shared between the detection callback and the
//! render loop.
//!
//! Writers replace the whole snapshot, readers take a copy. The lock is held
//! only for the copy in either direction.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::landmarks::{Handedness, LandmarkPoint};

/// Contents of the store at one point in time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Landmarks of the tracked hand (empty when no hand is in view)
    pub landmarks: Vec<LandmarkPoint>,
    /// Handedness of the tracked hand
    pub handedness: Handedness,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Cross-thread holder of the most recent detection
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<Mutex<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot.
    ///
    /// An empty landmark slice means the hand was lost and clears the
    /// handedness as well.
    pub fn update(&self, landmarks: &[LandmarkPoint], handedness: Handedness) {
        let handedness = if landmarks.is_empty() {
            Handedness::Unknown
        } else {
            handedness
        };
        // Copy outside the lock, swap inside it
        let mut next = Snapshot {
            landmarks: landmarks.to_vec(),
            handedness,
        };
        std::mem::swap(&mut *self.inner.lock(), &mut next);
    }

    /// Clear the store (equivalent to `update(&[], _)`)
    pub fn clear(&self) {
        self.update(&[], Handedness::Unknown);
    }

    /// Copy of the current snapshot
    pub fn read(&self) -> Snapshot {
        self.inner.lock().clone()
    }
}
