//! Top-level application state and the frame loop.
//!
//! `AppState` owns the fixed tree parameters, the input mapper and the
//! pointer tracker.  Each frame it takes the pointer source's detection and
//! hands back the immutable [`TreeParams`] to draw.

use std::sync::mpsc;

use anyhow::{Context, Result};
use fractal_tree::{InputMapper, Point, PointerTracker, TreeAngles, TreeParams};

use crate::capture::CaptureError;
use crate::config::{AppConfig, InputMode};
use crate::pointer::{PointerSource, SimInput, SimPointerSource};
use crate::visualizer::{PreviewWindow, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    base:    TreeParams,
    mapper:  InputMapper,
    tracker: PointerTracker,
    angles:  TreeAngles,
    frame:   u64,

    pub status: String,
}

impl AppState {
    /// Start with the pointer at the center of the mapper's frame.
    pub fn new(base: TreeParams, mapper: InputMapper) -> Self {
        let tracker = PointerTracker::centered(&mapper);
        let angles = mapper.angles(tracker.location());
        let mut app = AppState {
            base,
            mapper,
            tracker,
            angles,
            frame: 0,
            status: String::new(),
        };
        app.status = app.describe();
        app
    }

    // ── per-frame update ─────────────────────────────────────────────────

    /// Fold in this frame's detection and return the parameters to draw.
    pub fn update(&mut self, detected: Option<Point>) -> TreeParams {
        let location = self.tracker.update(detected);
        self.angles = self.mapper.angles(location);
        self.frame += 1;
        self.status = self.describe();
        self.params()
    }

    fn describe(&self) -> String {
        let hand = if !self.tracker.has_detection() {
            "waiting"
        } else if self.tracker.missed_frames() == 0 {
            "tracking"
        } else {
            "lost"
        };
        format!(
            "tilt {:.1}  bias {:.1}  hand: {}",
            self.angles.tilt_degrees(), self.angles.bias_degrees(), hand
        )
    }

    // ── accessors ────────────────────────────────────────────────────────

    /// Parameters for the current angles.
    pub fn params(&self)  -> TreeParams      { self.base.with_angles(self.angles) }
    pub fn angles(&self)  -> TreeAngles      { self.angles }
    pub fn tracker(&self) -> &PointerTracker { &self.tracker }
    pub fn frames(&self)  -> u64             { self.frame }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the pointer source chosen by the configuration and the tree
/// window, then drives capture → detect → map → poll → generate → render →
/// present at the configured frame rate.  Returns `Ok` when the user quits
/// or the capture source fails, including a camera or replay directory
/// that cannot be opened; windows and the camera are released on the way
/// out.  Only configuration and window errors are reported as `Err`.
pub fn run(cfg: AppConfig) -> Result<()> {
    cfg.validate().context("invalid configuration")?;
    let base = cfg.tree_params()?;

    // ── Pointer source (mouse simulation by default) ──────────────────────
    let (sim_tx, mut source) = match open_source(&cfg) {
        Ok(parts) => parts,
        Err(e) => {
            log_capture_end(&e);
            return Ok(());
        }
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(&cfg.window, sim_tx)
        .map_err(anyhow::Error::msg)
        .context("cannot open the tree window")?;
    let mut preview: Option<PreviewWindow> = None;

    let (fw, fh) = source.frame_size();
    let mut app = AppState::new(base, cfg.mapper(fw, fh));
    log::info!("pointer frame {}x{}, {}", fw, fh, app.status);

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Capture + detect + map.  The mouse source sees the position
        //    the window reported at the end of the previous frame.
        let Some(params) = tick(source.as_mut(), &mut app) else { break };

        // 2. Window input: quit request, mouse for the simulated source
        if !vis.poll_input() {
            log::info!("quit requested");
            break;
        }

        // 3. Generate, render, present
        vis.render(params.branches(), &app.status)
            .map_err(anyhow::Error::msg)
            .context("cannot present frame")?;

        // 4. Camera preview
        if cfg.input.preview {
            if let Some(frame) = source.preview() {
                if preview.is_none() {
                    preview = Some(
                        PreviewWindow::new(frame.width(), frame.height())
                            .map_err(anyhow::Error::msg)
                            .context("cannot open the preview window")?,
                    );
                }
                if let Some(win) = preview.as_mut().filter(|w| w.is_open()) {
                    win.show(frame)
                        .map_err(anyhow::Error::msg)
                        .context("cannot present preview")?;
                }
            }
        }
    }

    log::info!("stopped after {} frames", app.frames());
    Ok(())
}

/// One frame's capture and mapping.  `None` once the source has failed,
/// which ends the run.
fn tick(source: &mut dyn PointerSource, app: &mut AppState) -> Option<TreeParams> {
    match source.poll() {
        Ok(detected) => Some(app.update(detected)),
        Err(e) => {
            log_capture_end(&e);
            None
        }
    }
}

fn log_capture_end(e: &CaptureError) {
    match e {
        CaptureError::Exhausted    => log::info!("replay finished"),
        CaptureError::Disconnected => log::info!("window closed"),
        other                      => log::info!("capture ended: {}", other),
    }
}

type SourceParts = (Option<mpsc::Sender<SimInput>>, Box<dyn PointerSource>);

/// Build the configured pointer source.  A device or directory that cannot
/// be opened is a capture failure like any other.
fn open_source(cfg: &AppConfig) -> Result<SourceParts, CaptureError> {
    match cfg.input.mode {
        InputMode::Mouse => {
            let (tx, rx) = mpsc::channel::<SimInput>();
            let src = SimPointerSource::new(rx, cfg.window.width as u32, cfg.window.height as u32);
            Ok((Some(tx), Box::new(src)))
        }
        InputMode::Replay => {
            use crate::capture::ImageSequence;
            use crate::detect::SkinDetector;
            use crate::pointer::DetectingSource;

            let dir = cfg
                .input
                .replay_dir
                .as_deref()
                .ok_or_else(|| CaptureError::Open("no replay directory".into()))?;
            let frames = ImageSequence::open(dir)?;
            let detector = SkinDetector::new(cfg.input.min_pixels, cfg.input.stride);
            Ok((None, Box::new(DetectingSource::new(frames, detector, cfg.input.mirror_preview))))
        }
        InputMode::Camera => open_camera(cfg),
    }
}

#[cfg(feature = "camera")]
fn open_camera(cfg: &AppConfig) -> Result<SourceParts, CaptureError> {
    use crate::capture::Webcam;
    use crate::detect::SkinDetector;
    use crate::pointer::DetectingSource;

    let cam = Webcam::open(cfg.input.camera_index)?;
    let detector = SkinDetector::new(cfg.input.min_pixels, cfg.input.stride);
    Ok((None, Box::new(DetectingSource::new(cam, detector, cfg.input.mirror_preview))))
}

#[cfg(not(feature = "camera"))]
fn open_camera(cfg: &AppConfig) -> Result<SourceParts, CaptureError> {
    Err(CaptureError::Open(format!(
        "camera {}: this build has no camera support (`--features camera`)",
        cfg.input.camera_index
    )))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageSequence;
    use crate::detect::SkinDetector;
    use crate::pointer::DetectingSource;
    use image::{Rgb, RgbImage};

    fn make_app() -> AppState {
        let cfg = AppConfig::default();
        AppState::new(cfg.tree_params().unwrap(), cfg.mapper(900, 750))
    }

    #[test]
    fn starts_centered() {
        let app = make_app();
        assert!((app.angles().tilt_degrees() - 45.0).abs() < 1e-9);
        assert!((app.angles().bias_degrees() - 45.0).abs() < 1e-9);
        assert!(app.status.contains("waiting"));
    }

    #[test]
    fn detection_drives_angles() {
        let mut app = make_app();
        let p = app.update(Some(Point::new(0.0, 750.0)));
        assert_eq!(p.tilt(), 0.0);
        assert!((p.bias_increment() - 90f64.to_radians()).abs() < 1e-12);
        assert!(app.status.contains("tracking"));
    }

    #[test]
    fn lost_hand_keeps_previous_shape() {
        let mut app = make_app();
        let seen = app.update(Some(Point::new(225.0, 150.0)));
        for _ in 0..10 {
            assert_eq!(app.update(None), seen);
        }
        assert!(app.status.contains("lost"));
        assert_eq!(app.frames(), 11);
    }

    #[test]
    fn params_keep_fixed_fields() {
        let mut app = make_app();
        let p = app.update(Some(Point::new(10.0, 10.0)));
        assert_eq!(p.origin(), Point::new(450.0, 550.0));
        assert_eq!(p.branches().count(), 2047);
    }

    #[test]
    fn replay_pipeline_feeds_tracker_until_exhausted() {
        let mut hand = RgbImage::from_pixel(90, 75, Rgb([0, 0, 0]));
        for y in 0..10 {
            for x in 80..90 {
                hand.put_pixel(x, y, Rgb([224, 172, 140]));
            }
        }
        let empty = RgbImage::from_pixel(90, 75, Rgb([0, 0, 0]));
        let frames = ImageSequence::from_frames(vec![hand, empty]).unwrap();
        let mut src = DetectingSource::new(frames, SkinDetector::new(50, 1), true);

        let cfg = AppConfig::default();
        let (fw, fh) = src.frame_size();
        let mut app = AppState::new(cfg.tree_params().unwrap(), cfg.mapper(fw, fh));

        let first = app.update(src.poll().unwrap());
        let second = app.update(src.poll().unwrap());
        assert_eq!(first, second);
        assert_eq!(app.tracker().location(), Point::new(84.0, 4.0));
        assert!(matches!(src.poll(), Err(CaptureError::Exhausted)));
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn camera_unavailable_is_a_capture_failure() {
        let mut cfg = AppConfig::default();
        cfg.input.mode = InputMode::Camera;
        assert!(matches!(open_source(&cfg), Err(CaptureError::Open(_))));
    }

    #[test]
    fn unopenable_replay_dir_ends_run_normally() {
        let mut cfg = AppConfig::default();
        cfg.input.mode = InputMode::Replay;
        cfg.input.replay_dir = Some(std::env::temp_dir().join("hand_tree_no_such_frames_dir"));
        assert!(matches!(open_source(&cfg), Err(CaptureError::Open(_))));
        // Returns before any window is created.
        assert!(run(cfg).is_ok());
    }

    #[test]
    fn invalid_config_is_still_an_error() {
        let mut cfg = AppConfig::default();
        cfg.tree.decay = 2.0;
        assert!(run(cfg).is_err());
    }

    #[test]
    fn tick_captures_before_anything_else_and_stops_on_failure() {
        let frames = ImageSequence::from_frames(vec![RgbImage::from_pixel(90, 75, Rgb([0, 0, 0]))])
            .unwrap();
        let mut src = DetectingSource::new(frames, SkinDetector::new(50, 1), false);
        let mut app = make_app();

        assert!(tick(&mut src, &mut app).is_some());
        assert_eq!(tick(&mut src, &mut app), None);
        // A failed capture leaves the state untouched.
        assert_eq!(app.frames(), 1);
    }

    #[test]
    fn mouse_mode_uses_window_size() {
        let (tx, src) = open_source(&AppConfig::default()).unwrap();
        assert!(tx.is_some());
        assert_eq!(src.frame_size(), (900, 750));
    }
}
