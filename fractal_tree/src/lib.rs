//! # fractal_tree
//!
//! Binary fractal trees whose splay and lean follow a 2D pointer.
//!
//! A tree is described by an immutable [`TreeParams`]: origin, trunk length,
//! decay ratio, depth bound, and the two angles derived from the pointer each
//! frame.  [`TreeParams::branches`] walks the tree with an explicit work stack
//! and yields one [`Segment`] per drawn line, trunk first.
//!
//! ## Pointer → angle mapping
//!
//! | Pointer axis | Range | Parameter | Effect |
//! |---|---|---|---|
//! | x | `0..frame_width`  | tilt | symmetric splay of every fork |
//! | y | `0..frame_height` | bias | lean added once more at every level |
//!
//! Both default to a 0°–90° output range.  Inputs outside the frame
//! extrapolate linearly; see [`map_range`].
//!
//! ## Termination
//!
//! A branch stops when its length drops to 1 px or below, *and*
//! independently after `max_depth` levels.  With the reference constants
//! (`size = 200`, `decay = 0.65`, `max_depth = 10`) the depth guard binds
//! first and a frame holds exactly 2047 segments.
//!
//! ```
//! use fractal_tree::{InputMapper, Point, TreeParams};
//!
//! let mapper = InputMapper::new(900, 750);
//! let params = TreeParams::new(Point::new(450.0, 550.0), 200.0, 0.65, 10)
//!     .unwrap()
//!     .with_angles(mapper.angles(mapper.center()));
//! assert_eq!(params.branches().count(), 2047);
//! ```

pub mod geometry;
pub mod mapper;
pub mod tree;

pub use geometry::{Point, Segment};
pub use mapper::{map_range, InputMapper, PointerTracker, TreeAngles};
pub use tree::{
    generate, segment_bound, Branches, TreeError, TreeParams,
    DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, MIN_BRANCH_LENGTH,
};
