//! Camera-space to screen-space mapping

use crate::landmarks::LandmarkPoint;
use crate::pointer::ScreenSize;

/// Linear rescale of `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Not clamped. Callers guarantee `in_max != in_min`.
pub fn remap(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Maps a normalized fingertip onto screen pixels, ignoring a border of
/// `margin` camera pixels on every side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenMapper {
    pub camera_width: f32,
    pub camera_height: f32,
    pub margin: f32,
    pub screen: ScreenSize,
    /// Clamp results to the screen rectangle. Off by default: the raw
    /// remap result, including points in the margin, feeds smoothing.
    pub clamp: bool,
}

impl ScreenMapper {
    pub fn new(camera_width: u32, camera_height: u32, margin: f32, screen: ScreenSize) -> Self {
        Self {
            camera_width: camera_width as f32,
            camera_height: camera_height as f32,
            margin,
            screen,
            clamp: false,
        }
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    /// Whether the active region has a positive extent on both axes
    pub fn is_valid(&self) -> bool {
        self.camera_width > 2.0 * self.margin && self.camera_height > 2.0 * self.margin
    }

    /// Map a normalized landmark to a screen position
    pub fn map(&self, point: LandmarkPoint) -> (f32, f32) {
        let cam_x = point.x * self.camera_width;
        let cam_y = point.y * self.camera_height;
        let screen_w = self.screen.width as f32;
        let screen_h = self.screen.height as f32;

        let x = remap(cam_x, self.margin, self.camera_width - self.margin, 0.0, screen_w);
        let y = remap(cam_y, self.margin, self.camera_height - self.margin, 0.0, screen_h);

        if self.clamp {
            (x.clamp(0.0, screen_w), y.clamp(0.0, screen_h))
        } else {
            (x, y)
        }
    }
}
