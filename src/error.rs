//! Error types for neighbor-search operations
//!
//! Every variant is a call-time contract violation surfaced directly to
//! the caller; nothing is retried or recovered internally.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeighborError {
    /// The periodic box argument is malformed: wrong dimensionality for
    /// the indexed points, a non-square matrix, or a sheared (non-diagonal)
    /// matrix. Only orthogonal boxes are supported.
    #[error("invalid box: {0}")]
    InvalidBox(String),

    /// A query or data point has the wrong number of coordinates.
    #[error("dimension mismatch: expected {expected} coordinates, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An argument violates the call contract (k == 0, p < 1, negative
    /// radius, or a bad r/n combination in the facade).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is deliberately not implemented for periodic trees.
    #[error("{0} is not supported for periodic trees")]
    UnsupportedOperation(&'static str),
}

pub type Result<T> = std::result::Result<T, NeighborError>;
