//! Landmark model that replays recorded detections.
//!
//! Script format: one JSON value per line, one line per frame.
//!
//! ```text
//! []                                                   no hand
//! [{"landmarks": [[0.5, 0.4], ...], "handedness": "Right"}]
//! {"error": "model timeout"}                           failed result
//! ```

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::camera::CameraFrame;
use crate::error::DetectionError;
use crate::landmarks::{HandDetection, Handedness, LandmarkPoint};

use super::LandmarkModel;

#[derive(Deserialize)]
struct ScriptedHand {
    landmarks: Vec<[f32; 2]>,
    #[serde(default)]
    handedness: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptedFrame {
    Hands(Vec<ScriptedHand>),
    Failure { error: String },
}

type ScriptedOutcome = Result<Vec<HandDetection>, String>;

/// Replays a fixed list of detection outcomes, one per frame
pub struct ScriptedModel {
    frames: VecDeque<ScriptedOutcome>,
    latency: Duration,
}

impl ScriptedModel {
    pub fn new(frames: Vec<ScriptedOutcome>) -> Self {
        Self {
            frames: frames.into(),
            latency: Duration::ZERO,
        }
    }

    /// Sleep this long per frame, to mimic inference time
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Parse a JSON-lines script. Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, String> {
        let mut frames = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| e.to_string())?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame: ScriptedFrame = serde_json::from_str(line)
                .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
            frames.push(match frame {
                ScriptedFrame::Hands(hands) => Ok(hands
                    .into_iter()
                    .map(|hand| {
                        HandDetection::new(
                            hand.landmarks.into_iter().map(LandmarkPoint::from).collect(),
                            hand.handedness
                                .as_deref()
                                .map(Handedness::from_label)
                                .unwrap_or_default(),
                        )
                    })
                    .collect()),
                ScriptedFrame::Failure { error } => Err(error),
            });
        }
        Ok(Self::new(frames))
    }

    pub fn from_file(path: &Path) -> Result<Self, DetectionError> {
        let file = std::fs::File::open(path).map_err(|e| DetectionError::Script {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model = Self::from_reader(std::io::BufReader::new(file)).map_err(|reason| {
            DetectionError::Script {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        log::info!("Loaded {} scripted frames from {:?}", model.remaining(), path);
        Ok(model)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkModel for ScriptedModel {
    fn detect(&mut self, _frame: &CameraFrame) -> Result<Vec<HandDetection>, DetectionError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        match self.frames.pop_front() {
            Some(Ok(hands)) => Ok(hands),
            Some(Err(reason)) => Err(DetectionError::Inference(reason)),
            // Script exhausted: nothing in view
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
