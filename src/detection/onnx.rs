//! ONNX Runtime hand landmark model
//!
//! Runs a MediaPipe-compatible hand landmark network (224x224 NHWC input)
//! over the whole frame. Outputs, in order: 21x3 landmarks in input pixels,
//! hand presence score, handedness score (> 0.5 means right hand).

use std::path::{Path, PathBuf};

use ndarray::Array4;

use crate::camera::CameraFrame;
use crate::error::DetectionError;
use crate::landmarks::{HandDetection, Handedness, LandmarkPoint, LANDMARK_COUNT};

use super::LandmarkModel;

const INPUT_SIZE: u32 = 224;
const DEFAULT_MODEL_FILE: &str = "hand_landmark.onnx";

/// Hand landmark inference session
pub struct OnnxHandLandmarker {
    session: ort::session::Session,
    min_confidence: f32,
}

impl OnnxHandLandmarker {
    /// Load the model at `path`, or look for `models/hand_landmark.onnx`
    /// next to the executable and in the working directory.
    pub fn load(path: Option<&Path>, min_confidence: f32) -> Result<Self, DetectionError> {
        let model_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::find_model_dir()?.join(DEFAULT_MODEL_FILE),
        };
        if !model_path.exists() {
            return Err(DetectionError::ModelNotFound(model_path));
        }

        ort::init()
            .with_name("VirtualTouch")
            .commit()
            .map_err(|e| DetectionError::ModelLoad(format!("Failed to initialize ORT: {}", e)))?;

        let session = ort::session::Session::builder()
            .map_err(|e| DetectionError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_intra_threads(2)
            .map_err(|e| DetectionError::ModelLoad(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DetectionError::ModelLoad(format!("{:?}: {}", model_path, e)))?;

        log::info!("Loaded hand landmark model from {:?}", model_path);

        Ok(Self {
            session,
            min_confidence,
        })
    }

    /// Find the models directory
    fn find_model_dir() -> Result<PathBuf, DetectionError> {
        let mut candidates = Vec::new();
        if let Ok(exe_path) = std::env::current_exe() {
            // models/ beside the binary, or up to three levels above it (cargo target dirs)
            for ancestor in exe_path.ancestors().skip(1).take(4) {
                candidates.push(ancestor.join("models"));
            }
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join("models"));
        }

        candidates
            .into_iter()
            .find(|dir| dir.exists())
            .ok_or_else(|| DetectionError::ModelNotFound(PathBuf::from("models")))
    }

    /// Resize to the model input and convert to NHWC float [0, 1]
    fn preprocess(frame: &CameraFrame) -> Vec<f32> {
        let rgba = frame.downscale(INPUT_SIZE, INPUT_SIZE);
        rgba.chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .map(|v| v as f32 / 255.0)
            .collect()
    }

    fn probability(value: f32) -> f32 {
        // Some exports emit raw logits
        if (0.0..=1.0).contains(&value) {
            value
        } else {
            1.0 / (1.0 + (-value).exp())
        }
    }

    /// Turn raw output tensors into at most one hand
    fn decode(&self, outputs: &[Vec<f32>]) -> Result<Vec<HandDetection>, DetectionError> {
        let [coords, presence, handedness, ..] = outputs else {
            return Err(DetectionError::InvalidOutput(format!(
                "expected at least 3 outputs, got {}",
                outputs.len()
            )));
        };
        if coords.len() < LANDMARK_COUNT * 3 {
            return Err(DetectionError::InvalidOutput(format!(
                "landmark tensor has {} values",
                coords.len()
            )));
        }

        let score = presence.first().copied().map(Self::probability).unwrap_or(0.0);
        if score < self.min_confidence {
            return Ok(Vec::new());
        }

        let landmarks = coords
            .chunks_exact(3)
            .take(LANDMARK_COUNT)
            .map(|c| LandmarkPoint::new(c[0] / INPUT_SIZE as f32, c[1] / INPUT_SIZE as f32))
            .collect();
        let handedness = match handedness.first().copied().map(Self::probability) {
            Some(p) if p > 0.5 => Handedness::Right,
            Some(_) => Handedness::Left,
            None => Handedness::Unknown,
        };

        Ok(vec![HandDetection::new(landmarks, handedness)])
    }
}

impl LandmarkModel for OnnxHandLandmarker {
    fn detect(&mut self, frame: &CameraFrame) -> Result<Vec<HandDetection>, DetectionError> {
        let input = Self::preprocess(frame);
        let input_array = Array4::from_shape_vec(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            input,
        )
        .map_err(|e| DetectionError::Inference(format!("Failed to create input array: {}", e)))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| DetectionError::Inference(format!("Failed to create tensor: {}", e)))?;

        let raw: Vec<Vec<f32>> = {
            let outputs = self
                .session
                .run(ort::inputs![input_tensor])
                .map_err(|e| DetectionError::Inference(e.to_string()))?;

            let mut raw = Vec::new();
            for (_name, value) in outputs.iter() {
                let (_shape, data) = value
                    .try_extract_tensor::<f32>()
                    .map_err(|e| DetectionError::InvalidOutput(e.to_string()))?;
                raw.push(data.to_vec());
            }
            raw
        };

        self.decode(&raw)
    }

    fn name(&self) -> &str {
        "onnx-hand-landmark"
    }
}
