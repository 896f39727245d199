//! Application configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or none at
//! all) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gesture::{GestureMapper, ScreenMapper, DEFAULT_SMOOTH_ALPHA};
use crate::landmarks::Handedness;
use crate::pointer::ScreenSize;
use crate::telemetry::LogConfig;

/// Camera capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Requested capture rate; the device may pick the closest it supports
    pub fps: u32,
    /// Flip frames horizontally so the preview acts like a mirror
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
            mirror: true,
        }
    }
}

/// Gesture mapping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Dead band in camera pixels on every edge of the frame
    pub boundary_margin: f32,
    /// EMA weight of the newest cursor sample, in (0, 1]
    pub smooth_alpha: f32,
    /// Clamp remapped positions to the screen before smoothing
    pub clamp_to_screen: bool,
    /// Thumb polarity used when the detector cannot tell which hand it saw
    pub unknown_handedness: Handedness,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            boundary_margin: 170.0,
            smooth_alpha: DEFAULT_SMOOTH_ALPHA,
            clamp_to_screen: false,
            unknown_handedness: Handedness::Right,
        }
    }
}

/// Landmark detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Model file; searched for under `models/` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    pub min_confidence: f32,
    /// Frames allowed to wait for the detector before new ones are dropped
    pub queue_depth: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            min_confidence: 0.5,
            queue_depth: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub gesture: GestureConfig,
    /// Overrides the size reported by the pointer backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenSize>,
    pub detection: DetectionConfig,
    pub logging: LogConfig,
    /// Per-stage timing summary written at shutdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings_report: Option<PathBuf>,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/virtual-touch/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("virtual-touch");
            p.push("config.json");
            p
        })
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing. A file that exists but is broken is still an error.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let margin = self.gesture.boundary_margin;
        if !(margin >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "boundary_margin must be non-negative, got {}",
                margin
            )));
        }
        let (w, h) = (self.camera.width as f32, self.camera.height as f32);
        if w <= 2.0 * margin || h <= 2.0 * margin {
            return Err(ConfigError::Invalid(format!(
                "camera {}x{} leaves no active region inside a {} px margin",
                self.camera.width, self.camera.height, margin
            )));
        }
        let alpha = self.gesture.smooth_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "smooth_alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        if self.camera.fps == 0 {
            return Err(ConfigError::Invalid("camera fps must be at least 1".into()));
        }
        if self.detection.queue_depth == 0 {
            return Err(ConfigError::Invalid("queue_depth must be at least 1".into()));
        }
        if let Some(screen) = self.screen {
            if screen.width == 0 || screen.height == 0 {
                return Err(ConfigError::Invalid(format!("screen size {} is empty", screen)));
            }
        }
        Ok(())
    }

    /// Screen size: configured override, then what the pointer backend
    /// reports, then 1920x1080.
    pub fn resolve_screen(&self, reported: Option<ScreenSize>) -> ScreenSize {
        self.screen.or(reported).unwrap_or_default()
    }

    pub fn screen_mapper(&self, screen: ScreenSize) -> ScreenMapper {
        ScreenMapper::new(
            self.camera.width,
            self.camera.height,
            self.gesture.boundary_margin,
            screen,
        )
        .with_clamp(self.gesture.clamp_to_screen)
    }

    pub fn gesture_mapper(&self, screen: ScreenSize) -> GestureMapper {
        GestureMapper::new(self.screen_mapper(screen))
            .with_alpha(self.gesture.smooth_alpha)
            .with_unknown_handedness(self.gesture.unknown_handedness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.height, 480);
        assert!(config.camera.mirror);
        assert_eq!(config.gesture.boundary_margin, 170.0);
        assert_eq!(config.gesture.smooth_alpha, 0.2);
        assert_eq!(config.gesture.unknown_handedness, Handedness::Right);
        assert_eq!(config.detection.queue_depth, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"camera": {"index": 2}, "gesture": {"smooth_alpha": 0.5}}"#).unwrap();
        assert_eq!(config.camera.index, 2);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.gesture.smooth_alpha, 0.5);
        assert_eq!(config.gesture.boundary_margin, 170.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.screen = Some(ScreenSize::new(2560, 1440));
        config.gesture.unknown_handedness = Handedness::Left;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.screen, Some(ScreenSize::new(2560, 1440)));
        assert_eq!(loaded.gesture.unknown_handedness, Handedness::Left);
        assert_eq!(loaded.camera, config.camera);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load_from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_degenerate_region() {
        let mut config = AppConfig::default();
        config.gesture.boundary_margin = 240.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.gesture.boundary_margin = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_alpha_and_queue() {
        let mut config = AppConfig::default();
        config.gesture.smooth_alpha = 0.0;
        assert!(config.validate().is_err());
        config.gesture.smooth_alpha = 1.0;
        assert!(config.validate().is_ok());

        config.detection.queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let mut config = AppConfig::default();
        config.camera.fps = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config: AppConfig = serde_json::from_str(r#"{"camera": {"fps": 60}}"#).unwrap();
        assert_eq!(config.camera.fps, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_screen() {
        let mut config = AppConfig::default();
        assert_eq!(config.resolve_screen(None), ScreenSize::new(1920, 1080));
        assert_eq!(
            config.resolve_screen(Some(ScreenSize::new(1280, 720))),
            ScreenSize::new(1280, 720)
        );
        config.screen = Some(ScreenSize::new(800, 600));
        assert_eq!(
            config.resolve_screen(Some(ScreenSize::new(1280, 720))),
            ScreenSize::new(800, 600)
        );
    }

    #[test]
    fn test_screen_mapper_from_config() {
        let config = AppConfig::default();
        let mapper = config.screen_mapper(ScreenSize::new(1920, 1080));
        assert!(mapper.is_valid());
        let (x, _) = mapper.map(crate::landmarks::LandmarkPoint::new(0.5, 0.5));
        assert!((x - 960.0).abs() < 1e-3);
    }

    #[test]
    fn test_default_mapper_does_not_clamp_margin() {
        use crate::gesture::FingerState;
        use crate::landmarks::LandmarkPoint;
        use crate::pointer::PointerCommand;

        let config = AppConfig::default();
        assert!(!config.gesture.clamp_to_screen);
        let mut mapper = config.gesture_mapper(ScreenSize::new(1920, 1080));

        // x = 64 camera px is inside the 170 px margin: remaps to -678.4
        let commands = mapper.step(FingerState::from_bits([0, 1, 0, 0, 0]), LandmarkPoint::new(0.1, 0.5));
        let [PointerCommand::Move { x, y }] = commands[..] else {
            panic!("expected a single move, got {:?}", commands);
        };
        assert!((x - -135.68).abs() < 1e-3, "x = {}", x);
        assert!((y - 108.0).abs() < 1e-3);
    }
}
