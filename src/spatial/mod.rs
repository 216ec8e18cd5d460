//! Plain (non-periodic) spatial search
//!
//! The kd-tree here indexes a fixed point set in ordinary Euclidean space;
//! the `periodic` module layers box wrapping and ghost images on top of it.

pub mod distance;
pub mod kdtree;

pub use kdtree::{KdTree, QueryOptions, DEFAULT_LEAF_SIZE};
