//! Periodic kd-tree: box-aware nearest-neighbor queries
//!
//! The index canonicalizes every data point into the box once, builds a
//! plain kd-tree over the wrapped copy, and answers each query by running
//! it once per relevant ghost image of the query point, then merging the
//! per-image hits. The tree is immutable after construction; there are no
//! insert/remove operations and no rebuilds.
//!
//! Correctness hinges on the radius cap: every query's effective radius is
//! limited to half the smallest periodic box edge
//! ([`PeriodicBox::max_distance_upper_bound`]). Beyond that radius two
//! distinct images of the same data point would both be in range and show
//! up as separate "neighbors". The cap is a correctness limit, not a
//! performance knob; callers needing longer-ranged neighbors on a periodic
//! axis must enlarge the box or drop periodicity.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;

use crate::error::{NeighborError, Result};
use crate::periodic::cell::PeriodicBox;
use crate::periodic::images::relevant_images;
use crate::spatial::kdtree::{KdTree, QueryOptions, DEFAULT_LEAF_SIZE};

/// One k-NN hit. Missing neighbors are padded with the sentinel
/// `distance == infinity`, `index == tree.len()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f64,
    pub index: usize,
}

/// Build-once spatial index over periodic space.
#[derive(Debug)]
pub struct PeriodicKdTree {
    bounds: PeriodicBox,
    tree: KdTree,
    n: usize,
    dim: usize,
    max_distance_upper_bound: f64,
}

impl PeriodicKdTree {
    /// Build an index over `points` inside `bounds`.
    ///
    /// All points are mapped to their canonical periodic image before the
    /// underlying tree is built; the caller's coordinates are not mutated
    /// and later changes to them are not seen by the index.
    pub fn new(bounds: PeriodicBox, points: &[Vec<f64>]) -> Result<Self> {
        Self::with_leaf_size(bounds, points, DEFAULT_LEAF_SIZE)
    }

    pub fn with_leaf_size(
        bounds: PeriodicBox,
        points: &[Vec<f64>],
        leaf_size: usize,
    ) -> Result<Self> {
        let dim = bounds.ndim();
        if dim == 0 {
            return Err(NeighborError::InvalidBox(
                "box must have at least one axis".into(),
            ));
        }
        if let Some(first) = points.first() {
            if first.len() != dim {
                return Err(NeighborError::InvalidBox(format!(
                    "box has {} axes but points have {} coordinates",
                    dim,
                    first.len()
                )));
            }
        }

        let n = points.len();
        let mut wrapped = Vec::with_capacity(n * dim);
        for row in points {
            if row.len() != dim {
                return Err(NeighborError::DimensionMismatch {
                    expected: dim,
                    got: row.len(),
                });
            }
            for (axis, &v) in row.iter().enumerate() {
                wrapped.push(bounds.wrap_coordinate(v, axis));
            }
        }

        let max_distance_upper_bound = bounds.max_distance_upper_bound();
        log::debug!(
            "building periodic kd-tree: {} points, {} axes, radius cap {}",
            n,
            dim,
            max_distance_upper_bound
        );
        let tree = KdTree::build(wrapped, dim, leaf_size);

        Ok(PeriodicKdTree {
            bounds,
            tree,
            n,
            dim,
            max_distance_upper_bound,
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn ndim(&self) -> usize {
        self.dim
    }

    pub fn bounds(&self) -> &PeriodicBox {
        &self.bounds
    }

    /// The cap applied to every query radius; see the module docs.
    pub fn max_distance_upper_bound(&self) -> f64 {
        self.max_distance_upper_bound
    }

    fn check_point(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.dim {
            return Err(NeighborError::DimensionMismatch {
                expected: self.dim,
                got: x.len(),
            });
        }
        Ok(())
    }

    fn check_options(opts: &QueryOptions) -> Result<()> {
        if !(opts.p >= 1.0) {
            return Err(NeighborError::InvalidArgument(format!(
                "only p-norms with 1 <= p <= infinity are permitted, got {}",
                opts.p
            )));
        }
        if !(opts.eps >= 0.0) {
            return Err(NeighborError::InvalidArgument(format!(
                "eps must be non-negative, got {}",
                opts.eps
            )));
        }
        Ok(())
    }

    /// Find the `k` nearest neighbors of `x` across periodic space.
    ///
    /// The result has exactly `k` entries, ascending by distance then
    /// index; when fewer than `k` candidates lie within the effective
    /// radius the tail is padded with sentinels (`infinity`, `len()`).
    ///
    /// The effective radius is `min(opts.distance_upper_bound,
    /// max_distance_upper_bound())` — an unconstrained request is silently
    /// limited to half the smallest periodic box edge.
    pub fn query(&self, x: &[f64], k: usize, opts: &QueryOptions) -> Result<Vec<Neighbor>> {
        self.check_point(x)?;
        Self::check_options(opts)?;
        if k == 0 {
            return Err(NeighborError::InvalidArgument(
                "k must be a positive integer".into(),
            ));
        }

        let bound = self.cap_radius(opts.distance_upper_bound, "distance_upper_bound");
        let effective = QueryOptions {
            distance_upper_bound: bound,
            ..*opts
        };

        let mut hits: Vec<(f64, usize)> = Vec::new();
        for image in relevant_images(x, &self.bounds, bound) {
            hits.extend(self.tree.query(&image, k, &effective));
        }
        hits.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        // Under the radius cap an index can only reappear across images at
        // the boundary distance itself; keep the first (closest) hit.
        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(k);
        for (distance, index) in hits {
            if seen.insert(index) {
                merged.push(Neighbor { distance, index });
                if merged.len() == k {
                    break;
                }
            }
        }
        while merged.len() < k {
            merged.push(Neighbor {
                distance: f64::INFINITY,
                index: self.n,
            });
        }
        Ok(merged)
    }

    /// Batched [`query`](Self::query): one independent k-NN search per row
    /// of `xs`, evaluated in parallel against the shared read-only index.
    pub fn query_batch(
        &self,
        xs: &[Vec<f64>],
        k: usize,
        opts: &QueryOptions,
    ) -> Result<Vec<Vec<Neighbor>>> {
        xs.par_iter().map(|x| self.query(x, k, opts)).collect()
    }

    /// Find all indexed points within `r` of `x` across periodic space.
    ///
    /// Returns ascending, deduplicated indices. `r` is capped at
    /// [`max_distance_upper_bound`](Self::max_distance_upper_bound); the
    /// reduction is logged but is not an error. A point whose own
    /// coordinate is queried is returned like any other match; callers
    /// filter self-hits if undesired.
    pub fn query_ball_point(&self, x: &[f64], r: f64, opts: &QueryOptions) -> Result<Vec<usize>> {
        self.check_point(x)?;
        Self::check_options(opts)?;
        if !(r >= 0.0) {
            return Err(NeighborError::InvalidArgument(format!(
                "radius must be non-negative, got {}",
                r
            )));
        }

        let r = self.cap_radius(r, "radius");
        let mut indices = Vec::new();
        for image in relevant_images(x, &self.bounds, r) {
            indices.extend(self.tree.query_ball(&image, r, opts));
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }

    /// Batched [`query_ball_point`](Self::query_ball_point), parallel per
    /// query point.
    pub fn query_ball_point_batch(
        &self,
        xs: &[Vec<f64>],
        r: f64,
        opts: &QueryOptions,
    ) -> Result<Vec<Vec<usize>>> {
        xs.par_iter()
            .map(|x| self.query_ball_point(x, r, opts))
            .collect()
    }

    fn cap_radius(&self, requested: f64, what: &str) -> f64 {
        if requested > self.max_distance_upper_bound {
            if requested.is_finite() {
                log::warn!(
                    "{} {} exceeds half the smallest periodic box edge, capping to {}",
                    what,
                    requested,
                    self.max_distance_upper_bound
                );
            }
            self.max_distance_upper_bound
        } else {
            requested
        }
    }

    /// Tree-vs-tree ball search is deliberately unsupported for periodic
    /// indexes.
    pub fn query_ball_tree(&self, _other: &PeriodicKdTree, _r: f64) -> Result<Vec<Vec<usize>>> {
        Err(NeighborError::UnsupportedOperation("query_ball_tree"))
    }

    /// Pairwise self-search is deliberately unsupported.
    pub fn query_pairs(&self, _r: f64) -> Result<Vec<(usize, usize)>> {
        Err(NeighborError::UnsupportedOperation("query_pairs"))
    }

    /// Pair counting against another index is deliberately unsupported.
    pub fn count_neighbors_with(&self, _other: &PeriodicKdTree, _r: f64) -> Result<usize> {
        Err(NeighborError::UnsupportedOperation("count_neighbors"))
    }

    /// Sparse distance matrices are deliberately unsupported.
    pub fn sparse_distance_matrix(
        &self,
        _other: &PeriodicKdTree,
        _max_distance: f64,
    ) -> Result<Vec<(usize, usize, f64)>> {
        Err(NeighborError::UnsupportedOperation("sparse_distance_matrix"))
    }
}
