//! # hand_tree
//!
//! A fractal tree that bends with your hand.  A webcam (or the mouse) gives
//! a pointer location each frame; its x and y become the tree's tilt and
//! branch spread, and the whole tree is redrawn from scratch.
//!
//! ## Pointer → tree mapping
//!
//! | Pointer | Range | Tree parameter |
//! |---|---|---|
//! | x | `0 ..= frame width` | tilt, `0 ..= 90°` |
//! | y | `0 ..= frame height` | bias increment, `0 ..= 90°` |
//!
//! Frames with no hand keep the last known location, so the tree holds
//! its shape until the hand comes back.
//!
//! ## Windows
//!
//! * **tree** — the fractal, plus a one-line status HUD.
//! * **Image** — the camera frame with a crosshair on the detected hand,
//!   mirrored for a natural view (camera and replay input only).
//!
//! ## Feature flags
//!
//! * (default) — **Mouse mode** and **replay mode**: the mouse over the tree
//!   window, or a directory of recorded frames, drives the pointer.
//! * `camera` — **Camera mode**: live capture through `nokhwa`.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `H` | Toggle the status HUD |
//! | `Q` / `Escape` | Quit |

pub mod config;
pub mod capture;
pub mod detect;
pub mod pointer;
pub mod visualizer;
pub mod app;
