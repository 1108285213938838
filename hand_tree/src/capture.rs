//! Frame sources — a live webcam (feature = "camera") or a directory of
//! recorded frames.
//!
//! A source is opened once at start-up and owned by the run loop.  Any
//! [`CaptureError`] from [`FrameSource::read_frame`] ends the program; there
//! is no retry.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open capture device: {0}")]
    Open(String),

    #[error("frame capture failed: {0}")]
    Frame(String),

    #[error("no more frames")]
    Exhausted,

    #[error("pointer source disconnected")]
    Disconnected,
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that yields RGB video frames.
pub trait FrameSource {
    /// Size of the frames this source produces.
    fn frame_size(&self) -> (u32, u32);

    /// Block until the next frame is available.
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;
}

// ════════════════════════════════════════════════════════════════════════════
// ImageSequence — recorded frames
// ════════════════════════════════════════════════════════════════════════════

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "ppm"];

/// Replays still images in file-name order, one per frame.
///
/// Files are decoded lazily.  Running out of frames is reported as
/// [`CaptureError::Exhausted`], which ends the run like a camera failure.
pub struct ImageSequence {
    first:  Option<RgbImage>,
    paths:  VecDeque<PathBuf>,
    frames: VecDeque<RgbImage>,
    size:   (u32, u32),
}

impl ImageSequence {
    /// Open every image in `dir`.  The first one is decoded immediately to
    /// learn the frame size.
    pub fn open(dir: &Path) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_frame_file(p))
            .collect();
        paths.sort();

        let mut paths: VecDeque<PathBuf> = paths.into();
        let first_path = paths
            .pop_front()
            .ok_or_else(|| CaptureError::Open(format!("{}: no image files", dir.display())))?;
        let first = decode(&first_path)?;
        let size = first.dimensions();
        log::info!(
            "replaying {} frames of {}x{} from {}",
            paths.len() + 1, size.0, size.1, dir.display()
        );

        Ok(ImageSequence { first: Some(first), paths, frames: VecDeque::new(), size })
    }

    /// A sequence over frames already in memory.
    pub fn from_frames(frames: Vec<RgbImage>) -> Result<Self, CaptureError> {
        let mut frames: VecDeque<RgbImage> = frames.into();
        let first = frames
            .pop_front()
            .ok_or_else(|| CaptureError::Open("empty frame list".into()))?;
        let size = first.dimensions();
        Ok(ImageSequence { first: Some(first), paths: VecDeque::new(), frames, size })
    }
}

impl FrameSource for ImageSequence {
    fn frame_size(&self) -> (u32, u32) {
        self.size
    }

    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let frame = if let Some(first) = self.first.take() {
            first
        } else if let Some(frame) = self.frames.pop_front() {
            frame
        } else if let Some(path) = self.paths.pop_front() {
            decode(&path)?
        } else {
            return Err(CaptureError::Exhausted);
        };

        if frame.dimensions() != self.size {
            return Err(CaptureError::Frame(format!(
                "frame is {}x{}, expected {}x{}",
                frame.width(), frame.height(), self.size.0, self.size.1
            )));
        }
        Ok(frame)
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn decode(path: &Path) -> Result<RgbImage, CaptureError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| CaptureError::Frame(format!("{}: {}", path.display(), e)))
}

// ════════════════════════════════════════════════════════════════════════════
// Webcam — real hardware (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

/// The system camera at a given index, streaming RGB frames.
///
/// Requires the `camera` feature.  The stream is stopped when the value is
/// dropped, including when the run loop ends on a capture failure.
#[cfg(feature = "camera")]
pub struct Webcam {
    camera: nokhwa::Camera,
    size:   (u32, u32),
}

#[cfg(feature = "camera")]
impl Webcam {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CaptureError::Open(e.to_string()))?;
        camera.open_stream().map_err(|e| CaptureError::Open(e.to_string()))?;

        let res = camera.resolution();
        let size = (res.width(), res.height());
        log::info!("camera {} streaming at {}x{}", index, size.0, size.1);
        Ok(Webcam { camera, size })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for Webcam {
    fn frame_size(&self) -> (u32, u32) {
        self.size
    }

    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;

        let buffer = self.camera.frame().map_err(|e| CaptureError::Frame(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Frame(e.to_string()))?;
        let (w, h) = (decoded.width(), decoded.height());
        // Rebuilt from raw bytes so nokhwa's `image` version need not match ours.
        RgbImage::from_raw(w, h, decoded.into_raw())
            .ok_or_else(|| CaptureError::Frame(format!("short frame buffer for {}x{}", w, h)))
    }
}

#[cfg(feature = "camera")]
impl Drop for Webcam {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(())  => log::info!("camera released"),
            Err(e)  => log::warn!("failed to stop camera stream: {}", e),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    #[test]
    fn sequence_plays_in_order_then_exhausts() {
        let mut seq = ImageSequence::from_frames(vec![solid(4, 3, 1), solid(4, 3, 2)]).unwrap();
        assert_eq!(seq.frame_size(), (4, 3));
        assert_eq!(seq.read_frame().unwrap().get_pixel(0, 0)[0], 1);
        assert_eq!(seq.read_frame().unwrap().get_pixel(0, 0)[0], 2);
        assert!(matches!(seq.read_frame(), Err(CaptureError::Exhausted)));
    }

    #[test]
    fn size_change_mid_sequence_is_a_capture_failure() {
        let mut seq = ImageSequence::from_frames(vec![solid(4, 3, 0), solid(5, 3, 0)]).unwrap();
        seq.read_frame().unwrap();
        assert!(matches!(seq.read_frame(), Err(CaptureError::Frame(_))));
    }

    #[test]
    fn empty_frame_list_is_rejected() {
        assert!(matches!(ImageSequence::from_frames(Vec::new()), Err(CaptureError::Open(_))));
    }

    #[test]
    fn open_reads_directory_sorted_and_skips_other_files() {
        let dir = std::env::temp_dir().join(format!("hand_tree_seq_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        solid(6, 4, 30).save(dir.join("b.png")).unwrap();
        solid(6, 4, 10).save(dir.join("a.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut seq = ImageSequence::open(&dir).unwrap();
        let first  = seq.read_frame().unwrap();
        let second = seq.read_frame().unwrap();
        let third  = seq.read_frame();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(seq.frame_size(), (6, 4));
        assert_eq!(first.get_pixel(0, 0)[0], 10);
        assert_eq!(second.get_pixel(0, 0)[0], 30);
        assert!(matches!(third, Err(CaptureError::Exhausted)));
    }

    #[test]
    fn open_empty_directory_fails() {
        let dir = std::env::temp_dir().join(format!("hand_tree_empty_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let res = ImageSequence::open(&dir);
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(res, Err(CaptureError::Open(_))));
    }
}
