//! Frame sources
//!
//! A [`CaptureSource`] hands out RGBA frames one at a time. The live webcam
//! source lives behind the `camera` feature; in-memory and image-directory
//! sources are always available for replay and tests.

#[cfg(feature = "camera")]
pub mod device;

#[cfg(feature = "camera")]
pub use device::DeviceCamera;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::CaptureError;

/// Camera frame data
#[derive(Clone)]
pub struct CameraFrame {
    /// RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame number
    pub frame_number: u64,
    /// Capture time
    pub timestamp: Instant,
}

impl CameraFrame {
    /// Wrap RGBA bytes. Short buffers are zero-padded.
    pub fn new(mut data: Vec<u8>, width: u32, height: u32, frame_number: u64) -> Self {
        data.resize((width * height * 4) as usize, 0);
        Self {
            data,
            width,
            height,
            frame_number,
            timestamp: Instant::now(),
        }
    }

    /// Solid black frame
    pub fn blank(width: u32, height: u32, frame_number: u64) -> Self {
        Self::new(Vec::new(), width, height, frame_number)
    }

    /// Flip left-right in place
    pub fn mirror_horizontal(&mut self) {
        let row_len = (self.width * 4) as usize;
        if row_len == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            let (mut left, mut right) = (0usize, self.width as usize - 1);
            while left < right {
                for c in 0..4 {
                    row.swap(left * 4 + c, right * 4 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }

    /// Nearest-neighbour resize into a new RGBA buffer
    pub fn downscale(&self, target_width: u32, target_height: u32) -> Vec<u8> {
        if self.width == target_width && self.height == target_height {
            return self.data.clone();
        }

        let mut output = vec![0u8; (target_width * target_height * 4) as usize];
        let x_ratio = self.width as f32 / target_width as f32;
        let y_ratio = self.height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                let src_x = (x as f32 * x_ratio) as u32;
                let src_y = (y as f32 * y_ratio) as u32;
                let src_idx = ((src_y * self.width + src_x) * 4) as usize;
                let dst_idx = ((y * target_width + x) * 4) as usize;

                if src_idx + 3 < self.data.len() {
                    output[dst_idx..dst_idx + 4].copy_from_slice(&self.data[src_idx..src_idx + 4]);
                }
            }
        }

        output
    }

    /// Pixel at (x, y), if inside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        self.data
            .get(idx..idx + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Something that produces camera frames.
///
/// `next_frame` may block; `None` means the source is exhausted.
pub trait CaptureSource {
    fn next_frame(&mut self) -> Option<CameraFrame>;

    /// Nominal frame size
    fn resolution(&self) -> (u32, u32);
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn next_frame(&mut self) -> Option<CameraFrame> {
        (**self).next_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// In-memory frame list
pub struct FrameSequence {
    frames: VecDeque<CameraFrame>,
    width: u32,
    height: u32,
}

impl FrameSequence {
    pub fn new(frames: Vec<CameraFrame>, width: u32, height: u32) -> Self {
        Self {
            frames: frames.into(),
            width,
            height,
        }
    }

    /// `count` blank frames
    pub fn blank(count: usize, width: u32, height: u32) -> Self {
        let frames = (0..count)
            .map(|i| CameraFrame::blank(width, height, i as u64))
            .collect();
        Self::new(frames, width, height)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl CaptureSource for FrameSequence {
    fn next_frame(&mut self) -> Option<CameraFrame> {
        self.frames.pop_front().map(|mut frame| {
            frame.timestamp = Instant::now();
            frame
        })
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Replays the images in a directory, in file-name order, resized to a fixed
/// resolution.
pub struct ImageDirectory {
    paths: VecDeque<PathBuf>,
    width: u32,
    height: u32,
    frame_count: u64,
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

impl ImageDirectory {
    pub fn open(dir: &Path, width: u32, height: u32) -> Result<Self, CaptureError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CaptureError::Empty(dir.to_path_buf()));
        }
        log::info!("Replaying {} images from {:?}", paths.len(), dir);

        Ok(Self {
            paths: paths.into(),
            width,
            height,
            frame_count: 0,
        })
    }

    fn load(&self, path: &Path) -> Result<CameraFrame, CaptureError> {
        let image = image::open(path).map_err(|source| CaptureError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let image = image
            .resize_exact(self.width, self.height, image::imageops::FilterType::Triangle)
            .into_rgba8();
        Ok(CameraFrame::new(
            image.into_raw(),
            self.width,
            self.height,
            self.frame_count,
        ))
    }
}

impl CaptureSource for ImageDirectory {
    fn next_frame(&mut self) -> Option<CameraFrame> {
        while let Some(path) = self.paths.pop_front() {
            match self.load(&path) {
                Ok(frame) => {
                    self.frame_count += 1;
                    return Some(frame);
                }
                Err(e) => log::warn!("Skipping frame: {}", e),
            }
        }
        None
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> CameraFrame {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0, 255]);
            }
        }
        CameraFrame::new(data, width, height, 0)
    }

    #[test]
    fn test_mirror_horizontal() {
        let mut frame = gradient(3, 2);
        frame.mirror_horizontal();
        assert_eq!(frame.pixel(0, 0), Some([2, 0, 0, 255]));
        assert_eq!(frame.pixel(1, 1), Some([1, 1, 0, 255]));
        assert_eq!(frame.pixel(2, 1), Some([0, 1, 0, 255]));
    }

    #[test]
    fn test_downscale() {
        let frame = gradient(4, 4);
        let small = frame.downscale(2, 2);
        assert_eq!(small.len(), 2 * 2 * 4);
        // (1, 1) samples source (2, 2)
        assert_eq!(&small[12..16], &[2, 2, 0, 255]);
    }

    #[test]
    fn test_new_pads_short_buffer() {
        let frame = CameraFrame::new(vec![1, 2, 3], 2, 2, 7);
        assert_eq!(frame.data.len(), 16);
        assert_eq!(frame.frame_number, 7);
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn test_frame_sequence() {
        let mut source = FrameSequence::blank(3, 8, 6);
        assert_eq!(source.resolution(), (8, 6));
        assert_eq!(source.next_frame().map(|f| f.frame_number), Some(0));
        assert_eq!(source.remaining(), 2);
        source.next_frame();
        source.next_frame();
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_image_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png"] {
            let img = image::RgbaImage::from_pixel(10, 10, image::Rgba([9, 8, 7, 255]));
            img.save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageDirectory::open(dir.path(), 4, 4).unwrap();
        let first = source.next_frame().unwrap();
        assert_eq!((first.width, first.height), (4, 4));
        assert_eq!(first.pixel(0, 0), Some([9, 8, 7, 255]));
        assert!(source.next_frame().is_some());
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_image_directory_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageDirectory::open(dir.path(), 4, 4),
            Err(CaptureError::Empty(_))
        ));
    }
}
