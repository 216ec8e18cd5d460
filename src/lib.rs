//! pbctree
//!
//! Periodic-boundary nearest-neighbor search for molecular systems.
//! Builds a kd-tree over coordinates canonicalized into an orthogonal
//! simulation box and answers k-NN and radius queries that see through
//! periodic boundaries, as needed for bond guessing and neighbor analysis
//! in simulation cells.
//!
//! The index is built once and queried many times; every query's radius is
//! capped at half the smallest periodic box edge, which is what keeps
//! distinct periodic images of the same point from being double-counted.

pub mod error;
pub mod neighbors;
pub mod periodic;
pub mod spatial;

pub use error::NeighborError;
pub use neighbors::{count_neighbors, nearest_neighbors, NeighborHits, PeriodicSpec};
pub use periodic::{Neighbor, PeriodicBox, PeriodicKdTree};
pub use spatial::{KdTree, QueryOptions};
