//! Pointer sources — camera/replay hand detection and mouse simulation.
//!
//! The public interface is [`PointerSource::poll`], called once per frame.
//! Consumers don't need to know whether the location came from a detected
//! hand or from the mouse.

use std::sync::mpsc::{Receiver, TryRecvError};

use fractal_tree::Point;
use image::{imageops, Rgb, RgbImage};

use crate::capture::{CaptureError, FrameSource};
use crate::detect::{draw_marker, PointerDetector};

// ════════════════════════════════════════════════════════════════════════════
// PointerSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can report a pointer location once per frame.
pub trait PointerSource {
    /// Size of the coordinate space locations are reported in.
    fn frame_size(&self) -> (u32, u32);

    /// Acquire this frame's input.
    ///
    /// `Ok(None)` means nothing was detected this frame; `Err` means the
    /// source has failed and the run should end.
    fn poll(&mut self) -> Result<Option<Point>, CaptureError>;

    /// The most recent frame, annotated for display, if the source has one.
    fn preview(&self) -> Option<&RgbImage> {
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectingSource — frames + detector
// ════════════════════════════════════════════════════════════════════════════

const MARKER_COLOR:  Rgb<u8> = Rgb([255, 64, 64]);
const MARKER_RADIUS: i64     = 8;

/// A frame source paired with a detector.
///
/// Each poll captures one frame, runs detection on it, and keeps the frame
/// (with a marker on the detection, optionally mirrored) for preview.
pub struct DetectingSource<F, D> {
    frames:   F,
    detector: D,
    mirror:   bool,
    last:     Option<RgbImage>,
}

impl<F: FrameSource, D: PointerDetector> DetectingSource<F, D> {
    pub fn new(frames: F, detector: D, mirror: bool) -> Self {
        DetectingSource { frames, detector, mirror, last: None }
    }
}

impl<F: FrameSource, D: PointerDetector> PointerSource for DetectingSource<F, D> {
    fn frame_size(&self) -> (u32, u32) {
        self.frames.frame_size()
    }

    fn poll(&mut self) -> Result<Option<Point>, CaptureError> {
        let mut frame = self.frames.read_frame()?;
        let found = self.detector.detect(&frame);

        if let Some(at) = found {
            draw_marker(&mut frame, at, MARKER_RADIUS, MARKER_COLOR);
        }
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut frame);
        }
        self.last = Some(frame);
        Ok(found)
    }

    fn preview(&self) -> Option<&RgbImage> {
        self.last.as_ref()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimPointerSource — mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the tree window, fed to [`SimPointerSource`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse position in window pixels, or `None` when outside the window.
    Pointer(Option<(f32, f32)>),
}

/// Pointer source driven by [`SimInput`] events from the visualizer's window.
///
/// The window sends one event per frame over an `mpsc` queue on the same
/// thread; this decouples the window's event polling from pointer logic.
/// When the window side is dropped, polling reports
/// [`CaptureError::Disconnected`].
pub struct SimPointerSource {
    rx:   Receiver<SimInput>,
    size: (u32, u32),
}

impl SimPointerSource {
    pub fn new(rx: Receiver<SimInput>, width: u32, height: u32) -> Self {
        SimPointerSource { rx, size: (width, height) }
    }
}

impl PointerSource for SimPointerSource {
    fn frame_size(&self) -> (u32, u32) {
        self.size
    }

    fn poll(&mut self) -> Result<Option<Point>, CaptureError> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::Pointer(pos))      => latest = Some(pos),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_some() { break; }
                    return Err(CaptureError::Disconnected);
                }
            }
        }
        Ok(latest.flatten().map(Point::from))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageSequence;
    use crate::detect::SkinDetector;
    use std::sync::mpsc;

    #[test]
    fn sim_reports_latest_position_of_the_frame() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimPointerSource::new(rx, 900, 750);
        tx.send(SimInput::Pointer(Some((10.0, 20.0)))).unwrap();
        tx.send(SimInput::Pointer(Some((30.0, 40.0)))).unwrap();
        assert_eq!(src.poll().unwrap(), Some(Point::new(30.0, 40.0)));
        assert_eq!(src.frame_size(), (900, 750));
    }

    #[test]
    fn sim_without_events_detects_nothing() {
        let (_tx, rx) = mpsc::channel::<SimInput>();
        let mut src = SimPointerSource::new(rx, 10, 10);
        assert_eq!(src.poll().unwrap(), None);
    }

    #[test]
    fn sim_pointer_outside_window_detects_nothing() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimPointerSource::new(rx, 10, 10);
        tx.send(SimInput::Pointer(Some((1.0, 1.0)))).unwrap();
        tx.send(SimInput::Pointer(None)).unwrap();
        assert_eq!(src.poll().unwrap(), None);
    }

    #[test]
    fn sim_disconnect_is_a_capture_failure() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimPointerSource::new(rx, 10, 10);
        tx.send(SimInput::Pointer(Some((5.0, 5.0)))).unwrap();
        drop(tx);
        // Queued input is still delivered before the failure.
        assert_eq!(src.poll().unwrap(), Some(Point::new(5.0, 5.0)));
        assert!(matches!(src.poll(), Err(CaptureError::Disconnected)));
    }

    fn skin_frame(x0: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(40, 30, Rgb([0, 0, 0]));
        for y in 10..20 {
            for x in x0..x0 + 10 {
                img.put_pixel(x, y, Rgb([224, 172, 140]));
            }
        }
        img
    }

    #[test]
    fn detecting_source_runs_detector_and_keeps_preview() {
        let frames = ImageSequence::from_frames(vec![
            skin_frame(0),
            RgbImage::from_pixel(40, 30, Rgb([0, 0, 0])),
        ])
        .unwrap();
        let mut src = DetectingSource::new(frames, SkinDetector::new(20, 1), false);

        assert!(src.preview().is_none());
        assert_eq!(src.poll().unwrap(), Some(Point::new(4.0, 14.0)));
        let preview = src.preview().unwrap();
        assert_eq!(preview.get_pixel(4, 14), &MARKER_COLOR);

        assert_eq!(src.poll().unwrap(), None);
        assert!(matches!(src.poll(), Err(CaptureError::Exhausted)));
    }

    #[test]
    fn mirrored_preview_keeps_unmirrored_coordinates() {
        let frames = ImageSequence::from_frames(vec![skin_frame(0)]).unwrap();
        let mut src = DetectingSource::new(frames, SkinDetector::new(20, 1), true);
        assert_eq!(src.poll().unwrap(), Some(Point::new(4.0, 14.0)));
        // Marker at x = 4 lands at 40 - 1 - 4 = 35 once flipped.
        assert_eq!(src.preview().unwrap().get_pixel(35, 14), &MARKER_COLOR);
    }
}
