//! Pointer location → tree angles.
//!
//! [`InputMapper`] turns a pointer position inside a frame into the tilt and
//! bias of the tree.  [`PointerTracker`] keeps the last known position so a
//! frame without a detection renders with the previous shape.

use crate::geometry::Point;

/// Default upper end of the tilt range, degrees.
pub const MAX_TILT_DEG: f64 = 90.0;
/// Default upper end of the bias range, degrees.
pub const MAX_BIAS_DEG: f64 = 90.0;

// ════════════════════════════════════════════════════════════════════════════
// map_range
// ════════════════════════════════════════════════════════════════════════════

/// Linearly map `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Values outside the input range extrapolate; nothing is clamped.
///
/// # Panics
///
/// If the input range is empty (`in_min == in_max`) or not finite.  The
/// ranges used by this crate are fixed at start-up, so this is a caller bug.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let in_range = in_max - in_min;
    assert!(
        in_range != 0.0 && in_range.is_finite(),
        "map_range: degenerate input range [{in_min}, {in_max}]"
    );
    let percent = (value - in_min) / in_range;
    out_min + percent * (out_max - out_min)
}

// ════════════════════════════════════════════════════════════════════════════
// TreeAngles
// ════════════════════════════════════════════════════════════════════════════

/// The two pointer-driven tree angles, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TreeAngles {
    /// Symmetric splay of each fork.
    pub tilt: f64,
    /// Lean added to both children once per level.
    pub bias: f64,
}

impl TreeAngles {
    pub fn from_degrees(tilt: f64, bias: f64) -> Self {
        TreeAngles { tilt: tilt.to_radians(), bias: bias.to_radians() }
    }

    pub fn tilt_degrees(&self) -> f64 { self.tilt.to_degrees() }
    pub fn bias_degrees(&self) -> f64 { self.bias.to_degrees() }
}

// ════════════════════════════════════════════════════════════════════════════
// InputMapper
// ════════════════════════════════════════════════════════════════════════════

/// Maps frame coordinates onto `(tilt, bias)`.
///
/// x spans `0..width` → `0..max_tilt_deg`, y spans `0..height` →
/// `0..max_bias_deg`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputMapper {
    width:        u32,
    height:       u32,
    max_tilt_deg: f64,
    max_bias_deg: f64,
}

impl InputMapper {
    /// # Panics
    ///
    /// If either dimension is zero.
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        assert!(
            frame_width > 0 && frame_height > 0,
            "InputMapper: empty frame {frame_width}x{frame_height}"
        );
        InputMapper {
            width:        frame_width,
            height:       frame_height,
            max_tilt_deg: MAX_TILT_DEG,
            max_bias_deg: MAX_BIAS_DEG,
        }
    }

    /// Replace the output ranges (degrees).
    pub fn with_ranges(mut self, max_tilt_deg: f64, max_bias_deg: f64) -> Self {
        self.max_tilt_deg = max_tilt_deg;
        self.max_bias_deg = max_bias_deg;
        self
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The frame center, used as the pointer before any detection.
    pub fn center(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn angles(&self, pointer: Point) -> TreeAngles {
        let tilt = map_range(pointer.x, 0.0, self.width as f64, 0.0, self.max_tilt_deg);
        let bias = map_range(pointer.y, 0.0, self.height as f64, 0.0, self.max_bias_deg);
        TreeAngles::from_degrees(tilt, bias)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PointerTracker
// ════════════════════════════════════════════════════════════════════════════

/// Last known pointer location.
///
/// Always holds *some* location: the initial one until the first detection,
/// then whatever was detected most recently.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    last:          Point,
    detected_ever: bool,
    missed:        u32,
}

impl PointerTracker {
    pub fn new(initial: Point) -> Self {
        PointerTracker { last: initial, detected_ever: false, missed: 0 }
    }

    /// Tracker starting at the center of `mapper`'s frame.
    pub fn centered(mapper: &InputMapper) -> Self {
        Self::new(mapper.center())
    }

    /// Record this frame's detection and return the location to render with.
    pub fn update(&mut self, detected: Option<Point>) -> Point {
        match detected {
            Some(p) => {
                self.last = p;
                self.detected_ever = true;
                self.missed = 0;
            }
            None => self.missed = self.missed.saturating_add(1),
        }
        self.last
    }

    pub fn location(&self) -> Point { self.last }

    /// Consecutive frames since the last detection.
    pub fn missed_frames(&self) -> u32 { self.missed }

    pub fn has_detection(&self) -> bool { self.detected_ever }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_range_endpoints_and_midpoint() {
        assert_eq!(map_range(0.0, 0.0, 100.0, 0.0, 90.0), 0.0);
        assert_eq!(map_range(100.0, 0.0, 100.0, 0.0, 90.0), 90.0);
        assert_eq!(map_range(50.0, 0.0, 100.0, 0.0, 90.0), 45.0);
    }

    #[test]
    fn map_range_extrapolates_without_clamping() {
        assert_eq!(map_range(200.0, 0.0, 100.0, 0.0, 90.0), 180.0);
        assert_eq!(map_range(-100.0, 0.0, 100.0, 0.0, 90.0), -90.0);
    }

    #[test]
    fn map_range_handles_inverted_output() {
        assert_eq!(map_range(25.0, 0.0, 100.0, 90.0, 0.0), 67.5);
    }

    #[test]
    #[should_panic(expected = "degenerate input range")]
    fn map_range_rejects_empty_input_range() {
        map_range(5.0, 3.0, 3.0, 0.0, 90.0);
    }

    #[test]
    fn mapper_center_gives_half_ranges() {
        let m = InputMapper::new(900, 750);
        let a = m.angles(m.center());
        assert!((a.tilt_degrees() - 45.0).abs() < 1e-9);
        assert!((a.bias_degrees() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn mapper_custom_ranges() {
        let m = InputMapper::new(100, 100).with_ranges(60.0, 30.0);
        let a = m.angles(Point::new(100.0, 100.0));
        assert!((a.tilt_degrees() - 60.0).abs() < 1e-9);
        assert!((a.bias_degrees() - 30.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "empty frame")]
    fn mapper_rejects_empty_frame() {
        InputMapper::new(0, 480);
    }

    #[test]
    fn tracker_starts_at_initial_location() {
        let t = PointerTracker::centered(&InputMapper::new(640, 480));
        assert_eq!(t.location(), Point::new(320.0, 240.0));
        assert!(!t.has_detection());
    }

    #[test]
    fn tracker_retains_last_detection() {
        let mut t = PointerTracker::new(Point::new(0.0, 0.0));
        t.update(Some(Point::new(12.0, 34.0)));
        for _ in 0..5 {
            assert_eq!(t.update(None), Point::new(12.0, 34.0));
        }
        assert_eq!(t.missed_frames(), 5);
        t.update(Some(Point::new(1.0, 2.0)));
        assert_eq!(t.missed_frames(), 0);
        assert!(t.has_detection());
    }
}
