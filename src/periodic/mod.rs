//! Periodic-boundary spatial search
//!
//! Wraps the plain kd-tree in `spatial` with canonical-cell wrapping,
//! ghost-image generation, and radius capping so queries see through the
//! box boundaries.

pub mod cell;
pub mod images;
pub mod index;

pub use cell::PeriodicBox;
pub use index::{Neighbor, PeriodicKdTree};
