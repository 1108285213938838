//! Points, segments and the heading projection used by the generator.

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A position in window / frame pixels (x grows right, y grows down).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Step `length` pixels away from `self` along `heading` (radians).
    ///
    /// Headings are measured from +y: the result is
    /// `(x + sin(heading)·length, y + cos(heading)·length)`.  A heading of π
    /// therefore points toward the top of the window.
    pub fn project(self, heading: f64, length: f64) -> Point {
        Point {
            x: self.x + heading.sin() * length,
            y: self.y + heading.cos() * length,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x as f64, y as f64)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Segment
// ════════════════════════════════════════════════════════════════════════════

/// One line of the tree, parent end first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end:   Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Segment { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
