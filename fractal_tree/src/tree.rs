//! The fractal tree generator.
//!
//! A [`TreeParams`] is validated once and copied per frame with the frame's
//! angles.  [`Branches`] walks the tree depth-first with an explicit stack,
//! so termination never depends on call-stack depth.

use std::f64::consts::PI;

use thiserror::Error;

use crate::geometry::{Point, Segment};
use crate::mapper::TreeAngles;

/// Branching levels drawn by default.
pub const DEFAULT_MAX_DEPTH: u32 = 10;
/// Largest accepted `max_depth`; 2^21 − 1 segments per frame.
pub const MAX_DEPTH_LIMIT: u32 = 20;
/// Branches this short or shorter are not drawn.
pub const MIN_BRANCH_LENGTH: f64 = 1.0;

/// Heading of the first fork: straight up the window.
const CROWN_HEADING: f64 = PI;

// ════════════════════════════════════════════════════════════════════════════
// TreeError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("decay must lie strictly between 0 and 1, got {0}")]
    DecayOutOfRange(f64),

    #[error("trunk size must be positive and finite, got {0}")]
    InvalidSize(f64),

    #[error("origin must be finite, got ({x}, {y})")]
    InvalidOrigin { x: f64, y: f64 },

    #[error("max depth {depth} exceeds the limit of {limit}")]
    DepthTooLarge { depth: u32, limit: u32 },
}

// ════════════════════════════════════════════════════════════════════════════
// TreeParams
// ════════════════════════════════════════════════════════════════════════════

/// Everything needed to generate one frame's tree.
///
/// Origin, size, decay and depth are fixed at construction; tilt and bias
/// start at zero and are replaced per frame through [`with_angles`].
///
/// [`with_angles`]: TreeParams::with_angles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeParams {
    origin:         Point,
    size:           f64,
    decay:          f64,
    max_depth:      u32,
    tilt:           f64,
    bias_increment: f64,
}

impl TreeParams {
    pub fn new(origin: Point, size: f64, decay: f64, max_depth: u32) -> Result<Self, TreeError> {
        if !(decay > 0.0 && decay < 1.0) {
            return Err(TreeError::DecayOutOfRange(decay));
        }
        if !(size > 0.0 && size.is_finite()) {
            return Err(TreeError::InvalidSize(size));
        }
        if !origin.is_finite() {
            return Err(TreeError::InvalidOrigin { x: origin.x, y: origin.y });
        }
        if max_depth > MAX_DEPTH_LIMIT {
            return Err(TreeError::DepthTooLarge { depth: max_depth, limit: MAX_DEPTH_LIMIT });
        }
        Ok(TreeParams {
            origin,
            size,
            decay,
            max_depth,
            tilt:           0.0,
            bias_increment: 0.0,
        })
    }

    /// A copy of `self` carrying this frame's tilt and bias.
    pub fn with_angles(self, angles: TreeAngles) -> Self {
        TreeParams { tilt: angles.tilt, bias_increment: angles.bias, ..self }
    }

    pub fn origin(&self)         -> Point { self.origin }
    pub fn size(&self)           -> f64   { self.size }
    pub fn decay(&self)          -> f64   { self.decay }
    pub fn max_depth(&self)      -> u32   { self.max_depth }
    pub fn tilt(&self)           -> f64   { self.tilt }
    pub fn bias_increment(&self) -> f64   { self.bias_increment }

    pub fn angles(&self) -> TreeAngles {
        TreeAngles { tilt: self.tilt, bias: self.bias_increment }
    }

    /// The trunk: from the origin straight down by `size`.
    pub fn trunk(&self) -> Segment {
        Segment::new(self.origin, Point::new(self.origin.x, self.origin.y + self.size))
    }

    /// Lazily walk this tree, trunk first.
    pub fn branches(&self) -> Branches {
        Branches::new(*self)
    }
}

/// Generate every segment of `params`' tree, trunk first.
pub fn generate(params: &TreeParams) -> Vec<Segment> {
    params.branches().collect()
}

/// Upper bound on the segments of a tree with `max_depth` levels:
/// the trunk plus a full binary tree, `2^(max_depth + 1) − 1`.
pub fn segment_bound(max_depth: u32) -> usize {
    2usize.saturating_pow(max_depth.saturating_add(1)) - 1
}

// ════════════════════════════════════════════════════════════════════════════
// Branches — explicit-stack traversal
// ════════════════════════════════════════════════════════════════════════════

/// A fork waiting to be drawn.
#[derive(Clone, Copy, Debug)]
struct Fork {
    at:      Point,
    length:  f64,
    heading: f64,
    /// Lean accumulated by the levels above this fork.
    bias:    f64,
    /// 1 for the first fork at the origin.
    level:   u32,
}

/// Iterator over a tree's segments.
///
/// Order is pre-order: the trunk, then each fork's two segments followed by
/// the subtree of its first child and then of its second.  The stack never
/// holds more than `max_depth + 1` forks.
#[derive(Clone, Debug)]
pub struct Branches {
    params:  TreeParams,
    trunk:   Option<Segment>,
    pending: Option<Segment>,
    stack:   Vec<Fork>,
    emitted: usize,
}

impl Branches {
    fn new(params: TreeParams) -> Self {
        let mut stack = Vec::with_capacity(params.max_depth as usize + 1);
        if params.max_depth > 0 {
            stack.push(Fork {
                at:      params.origin,
                length:  params.size,
                heading: CROWN_HEADING,
                bias:    0.0,
                level:   1,
            });
        }
        Branches {
            params,
            trunk: Some(params.trunk()),
            pending: None,
            stack,
            emitted: 0,
        }
    }

    /// Forks still waiting on the stack.
    #[cfg(test)]
    fn pending_forks(&self) -> usize {
        self.stack.len()
    }

    fn next_segment(&mut self) -> Option<Segment> {
        if let Some(trunk) = self.trunk.take() {
            return Some(trunk);
        }
        if let Some(second) = self.pending.take() {
            return Some(second);
        }

        while let Some(fork) = self.stack.pop() {
            if fork.length <= MIN_BRANCH_LENGTH {
                log::trace!(
                    "branch cut at length {:.3}, level {}",
                    fork.length, fork.level
                );
                continue;
            }

            let TreeParams { tilt, bias_increment, decay, max_depth, .. } = self.params;
            let first_heading  = fork.heading + tilt;
            let second_heading = fork.heading - tilt;
            let first  = fork.at.project(first_heading  + fork.bias, fork.length);
            let second = fork.at.project(second_heading + fork.bias, fork.length);

            if fork.level < max_depth {
                let length = fork.length * decay;
                let bias   = fork.bias + bias_increment;
                let level  = fork.level + 1;
                // Second child pushed first so the first child's subtree comes out first.
                self.stack.push(Fork { at: second, length, heading: second_heading, bias, level });
                self.stack.push(Fork { at: first,  length, heading: first_heading,  bias, level });
            }

            self.pending = Some(Segment::new(fork.at, second));
            return Some(Segment::new(fork.at, first));
        }
        None
    }
}

impl Iterator for Branches {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let seg = self.next_segment()?;
        self.emitted += 1;
        Some(seg)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let bound = segment_bound(self.params.max_depth);
        let ready = self.trunk.is_some() as usize + self.pending.is_some() as usize;
        (ready, Some(bound.saturating_sub(self.emitted)))
    }
}

impl std::iter::FusedIterator for Branches {}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> TreeParams {
        TreeParams::new(Point::new(450.0, 550.0), 200.0, 0.65, DEFAULT_MAX_DEPTH).unwrap()
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-6
    }

    #[test]
    fn decay_outside_unit_interval_rejected() {
        let o = Point::new(0.0, 0.0);
        assert_eq!(TreeParams::new(o, 10.0, 1.0, 5), Err(TreeError::DecayOutOfRange(1.0)));
        assert_eq!(TreeParams::new(o, 10.0, 0.0, 5), Err(TreeError::DecayOutOfRange(0.0)));
        assert!(matches!(
            TreeParams::new(o, 10.0, f64::NAN, 5),
            Err(TreeError::DecayOutOfRange(_))
        ));
    }

    #[test]
    fn size_origin_and_depth_validated() {
        let o = Point::new(0.0, 0.0);
        assert_eq!(TreeParams::new(o, -1.0, 0.5, 5), Err(TreeError::InvalidSize(-1.0)));
        assert!(matches!(
            TreeParams::new(Point::new(f64::INFINITY, 0.0), 1.0, 0.5, 5),
            Err(TreeError::InvalidOrigin { .. })
        ));
        assert_eq!(
            TreeParams::new(o, 10.0, 0.5, MAX_DEPTH_LIMIT + 1),
            Err(TreeError::DepthTooLarge { depth: MAX_DEPTH_LIMIT + 1, limit: MAX_DEPTH_LIMIT })
        );
    }

    #[test]
    fn trunk_comes_first_and_hangs_down() {
        let first = reference().branches().next().unwrap();
        assert_eq!(first, Segment::new(Point::new(450.0, 550.0), Point::new(450.0, 750.0)));
    }

    #[test]
    fn zero_depth_draws_only_the_trunk() {
        let p = TreeParams::new(Point::new(0.0, 0.0), 50.0, 0.5, 0).unwrap();
        assert_eq!(generate(&p).len(), 1);
    }

    #[test]
    fn first_fork_is_pre_ordered() {
        let p = reference().with_angles(TreeAngles::from_degrees(30.0, 0.0));
        let segs = generate(&p);
        // trunk, first fork (2), then the first child's fork.
        assert_eq!(segs[1].start, p.origin());
        assert_eq!(segs[2].start, p.origin());
        assert_eq!(segs[3].start, segs[1].end);
        assert_eq!(segs[4].start, segs[1].end);
    }

    #[test]
    fn straight_crown_stacks_vertically() {
        let segs = generate(&reference());
        let fork = &segs[1];
        assert!(close(fork.end, Point::new(450.0, 350.0)));
        assert!(close(segs[2].end, fork.end));
    }

    #[test]
    fn stack_stays_shallow() {
        let mut it = reference().with_angles(TreeAngles::from_degrees(20.0, 5.0)).branches();
        let mut deepest = 0;
        while it.next().is_some() {
            deepest = deepest.max(it.pending_forks());
        }
        assert!(deepest <= DEFAULT_MAX_DEPTH as usize + 1, "stack grew to {}", deepest);
    }

    #[test]
    fn size_hint_respects_bound() {
        let it = reference().branches();
        assert_eq!(it.size_hint(), (1, Some(2047)));
    }

    #[test]
    fn segment_bound_values() {
        assert_eq!(segment_bound(0), 1);
        assert_eq!(segment_bound(1), 3);
        assert_eq!(segment_bound(10), 2047);
    }

    #[test]
    fn with_angles_keeps_fixed_fields() {
        let base = reference();
        let framed = base.with_angles(TreeAngles::from_degrees(45.0, 10.0));
        assert_eq!(framed.origin(), base.origin());
        assert_eq!(framed.size(), base.size());
        assert_eq!(framed.decay(), base.decay());
        assert!((framed.tilt() - 45f64.to_radians()).abs() < 1e-12);
        assert!((framed.bias_increment() - 10f64.to_radians()).abs() < 1e-12);
    }
}
