//! High-level neighbor searches between two point sets
//!
//! Convenience layer over [`PeriodicKdTree`] for the common "which points
//! of set B neighbor each point of set A" questions, selecting matches
//! either by radius or by count.

use crate::error::{NeighborError, Result};
use crate::periodic::{PeriodicBox, PeriodicKdTree};
use crate::spatial::QueryOptions;

/// Box argument accepted by the facade: either flat per-axis lengths or a
/// diagonal box matrix. Sheared (non-diagonal) matrices are rejected; only
/// orthogonal cells are supported.
#[derive(Debug, Clone)]
pub enum PeriodicSpec {
    Lengths(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl PeriodicSpec {
    /// Normalize to per-axis lengths.
    pub fn lengths(&self) -> Result<Vec<f64>> {
        match self {
            PeriodicSpec::Lengths(lengths) => Ok(lengths.clone()),
            PeriodicSpec::Matrix(rows) => {
                let n = rows.len();
                if rows.iter().any(|row| row.len() != n) {
                    return Err(NeighborError::InvalidBox(
                        "box matrix must be square".into(),
                    ));
                }
                for (i, row) in rows.iter().enumerate() {
                    for (j, &v) in row.iter().enumerate() {
                        if i != j && v != 0.0 {
                            return Err(NeighborError::InvalidBox(format!(
                                "box matrix has a shear term at ({}, {}); \
                                 only orthogonal boxes are supported",
                                i, j
                            )));
                        }
                    }
                }
                Ok(rows.iter().enumerate().map(|(i, row)| row[i]).collect())
            }
        }
    }
}

/// Result of [`nearest_neighbors`], shaped by the selection mode.
#[derive(Debug, Clone, PartialEq)]
pub enum NeighborHits {
    /// Radius selection: per query point, the matched indices into set B
    /// and the corresponding B coordinates.
    Radius {
        indices: Vec<Vec<usize>>,
        coords: Vec<Vec<Vec<f64>>>,
    },
    /// Count selection: per query point, `n` distances and indices,
    /// ascending, sentinel-padded when fewer candidates exist.
    Nearest {
        distances: Vec<Vec<f64>>,
        indices: Vec<Vec<usize>>,
    },
}

/// Neighbor search from each point of `points_a` into `points_b`.
///
/// Exactly one of `r` (radius selection) or `n` (count selection) must be
/// given. A `PeriodicKdTree` is built over `points_b` per call; callers
/// issuing many searches against the same set should build the index once
/// and query it directly.
pub fn nearest_neighbors(
    points_a: &[Vec<f64>],
    points_b: &[Vec<f64>],
    periodic: &PeriodicSpec,
    r: Option<f64>,
    n: Option<usize>,
) -> Result<NeighborHits> {
    if r.is_none() == n.is_none() {
        return Err(NeighborError::InvalidArgument(
            "exactly one of r and n must be given".into(),
        ));
    }
    if let (Some(a), Some(b)) = (points_a.first(), points_b.first()) {
        if a.len() != b.len() {
            return Err(NeighborError::DimensionMismatch {
                expected: b.len(),
                got: a.len(),
            });
        }
    }

    let bounds = PeriodicBox::new(periodic.lengths()?);
    let tree = PeriodicKdTree::new(bounds, points_b)?;
    let opts = QueryOptions::default();

    if let Some(r) = r {
        let indices = tree.query_ball_point_batch(points_a, r, &opts)?;
        let coords = indices
            .iter()
            .map(|hits| hits.iter().map(|&i| points_b[i].clone()).collect())
            .collect();
        return Ok(NeighborHits::Radius { indices, coords });
    }

    let n = n.unwrap_or_default();
    let per_point = tree.query_batch(points_a, n, &opts)?;
    let mut distances = Vec::with_capacity(per_point.len());
    let mut indices = Vec::with_capacity(per_point.len());
    for hits in per_point {
        distances.push(hits.iter().map(|nb| nb.distance).collect());
        indices.push(hits.iter().map(|nb| nb.index).collect());
    }
    Ok(NeighborHits::Nearest { distances, indices })
}

/// Count, per point of `points_a`, the points of `points_b` within `r`.
pub fn count_neighbors(
    points_a: &[Vec<f64>],
    points_b: &[Vec<f64>],
    periodic: &PeriodicSpec,
    r: f64,
) -> Result<Vec<usize>> {
    match nearest_neighbors(points_a, points_b, periodic, Some(r), None)? {
        NeighborHits::Radius { indices, .. } => Ok(indices.iter().map(Vec::len).collect()),
        NeighborHits::Nearest { .. } => unreachable!("radius search returns radius hits"),
    }
}
