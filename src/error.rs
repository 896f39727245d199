//! Error types for the fallible edges of the pipeline.
//!
//! The gesture core itself never fails; these cover configuration,
//! capture, detection, and pointer setup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading, saving or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors from frame sources.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open camera {index}: {reason}")]
    Open { index: u32, reason: String },
    #[error("Camera stream error: {0}")]
    Stream(String),
    #[error("Failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No frames found in {0}")]
    Empty(PathBuf),
}

/// Errors from the detection engine.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),
    #[error("Failed to read landmark script {path}: {reason}")]
    Script { path: PathBuf, reason: String },
    #[error("Failed to spawn detection worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors creating a pointer sink.
#[derive(Error, Debug)]
pub enum PointerError {
    #[error("Failed to initialize pointer injection: {0}")]
    Init(String),
}
