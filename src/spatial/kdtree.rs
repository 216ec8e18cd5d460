//! Non-periodic kd-tree over a fixed point set
//!
//! This is the plain spatial index that the periodic layer composes: it
//! knows nothing about boxes or wrapping. Points live in a flat coordinate
//! buffer with runtime dimensionality; nodes are stored in a flat array.
//!
//! Queries support Minkowski p-norms (1 <= p <= infinity), an
//! approximate-search tolerance `eps`, and a hard `distance_upper_bound`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::spatial::distance::{minkowski_distance_p, promote, reduce};

/// Number of points at which a subtree becomes a leaf bucket.
pub const DEFAULT_LEAF_SIZE: usize = 16;

/// Tuning knobs shared by all query kinds.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Minkowski norm order; 1 is Manhattan, 2 Euclidean, infinity Chebyshev.
    pub p: f64,
    /// Approximate-search tolerance: branches whose nearest possible point
    /// is further than `bound / (1 + eps)` are not explored. 0 is exact.
    pub eps: f64,
    /// Hard cap on returned distances (k-NN queries only).
    pub distance_upper_bound: f64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            p: 2.0,
            eps: 0.0,
            distance_upper_bound: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    /// Interior node: split dimension, split value, child node indices.
    Split {
        dim: usize,
        value: f64,
        left: usize,
        right: usize,
    },
    /// Leaf bucket: range [start..end) into the reordered point buffer.
    Leaf { start: usize, end: usize },
}

/// Candidate in the bounded k-NN heap; ordered so the heap root is the
/// current worst hit (largest reduced distance, ties broken by index).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    rdist: f64,
    index: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rdist
            .partial_cmp(&other.rdist)
            .unwrap_or(Ordering::Equal)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// kd-tree for nearest-neighbor and ball searches in m dimensions.
#[derive(Debug)]
pub struct KdTree {
    dim: usize,
    nodes: Vec<Node>,
    /// Flat coordinate buffer, reordered so each leaf is contiguous.
    coords: Vec<f64>,
    /// Original point index of each reordered slot.
    indices: Vec<usize>,
}

impl KdTree {
    /// Build a tree over `n = coords.len() / dim` points.
    ///
    /// `coords` is a row-major flat buffer; the tree keeps its own
    /// reordered copy, so callers are free to drop theirs.
    pub fn build(coords: Vec<f64>, dim: usize, leaf_size: usize) -> Self {
        assert!(dim > 0, "kd-tree dimensionality must be positive");
        assert_eq!(coords.len() % dim, 0, "coordinate buffer not divisible by dim");
        let n = coords.len() / dim;
        let leaf_size = leaf_size.max(1);

        let mut tree = KdTree {
            dim,
            nodes: Vec::new(),
            coords,
            indices: (0..n).collect(),
        };
        if n == 0 {
            return tree;
        }

        let mut order: Vec<usize> = (0..n).collect();
        tree.build_recursive(&mut order, 0, n, leaf_size);

        // Apply the permutation so leaves read sequentially.
        let mut coords = vec![0.0; tree.coords.len()];
        let mut indices = vec![0usize; n];
        for (slot, &src) in order.iter().enumerate() {
            coords[slot * dim..(slot + 1) * dim]
                .copy_from_slice(&tree.coords[src * dim..(src + 1) * dim]);
            indices[slot] = src;
        }
        tree.coords = coords;
        tree.indices = indices;
        tree
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn ndim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn point(&self, slot: usize) -> &[f64] {
        &self.coords[slot * self.dim..(slot + 1) * self.dim]
    }

    fn build_recursive(
        &mut self,
        order: &mut [usize],
        start: usize,
        end: usize,
        leaf_size: usize,
    ) -> usize {
        let count = end - start;
        if count <= leaf_size {
            let node_idx = self.nodes.len();
            self.nodes.push(Node::Leaf { start, end });
            return node_idx;
        }

        let split_dim = self.pick_split_dim(&order[start..end]);
        let median_pos = start + count / 2;
        self.nth_element(order, start, end, median_pos, split_dim);
        let split_value = self.coords[order[median_pos] * self.dim + split_dim];

        // Placeholder; patched once both children exist.
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf { start: 0, end: 0 });

        let left = self.build_recursive(order, start, median_pos, leaf_size);
        let right = self.build_recursive(order, median_pos, end, leaf_size);
        self.nodes[node_idx] = Node::Split {
            dim: split_dim,
            value: split_value,
            left,
            right,
        };
        node_idx
    }

    /// Split along the axis with the widest coordinate spread.
    fn pick_split_dim(&self, order: &[usize]) -> usize {
        let mut best_dim = 0;
        let mut best_spread = f64::NEG_INFINITY;
        for d in 0..self.dim {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &idx in order {
                let v = self.coords[idx * self.dim + d];
                if v < lo {
                    lo = v;
                }
                if v > hi {
                    hi = v;
                }
            }
            let spread = hi - lo;
            if spread > best_spread {
                best_spread = spread;
                best_dim = d;
            }
        }
        best_dim
    }

    /// Quickselect with median-of-three pivoting: after the call,
    /// `order[k]` holds the k-th smallest element along `dim`.
    fn nth_element(&self, order: &mut [usize], mut lo: usize, mut hi: usize, k: usize, dim: usize) {
        let coord = |idx: usize| self.coords[idx * self.dim + dim];
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let a = coord(order[lo]);
            let b = coord(order[mid]);
            let c = coord(order[hi - 1]);
            let pivot_idx = if (a <= b && b <= c) || (c <= b && b <= a) {
                mid
            } else if (b <= a && a <= c) || (c <= a && a <= b) {
                lo
            } else {
                hi - 1
            };
            order.swap(pivot_idx, hi - 1);
            let pivot_val = coord(order[hi - 1]);

            let mut store = lo;
            for i in lo..hi - 1 {
                if coord(order[i]) < pivot_val {
                    order.swap(i, store);
                    store += 1;
                }
            }
            order.swap(store, hi - 1);

            if store == k {
                return;
            } else if k < store {
                hi = store;
            } else {
                lo = store + 1;
            }
        }
    }

    /// Find up to `k` nearest neighbors of `x`.
    ///
    /// Returns `(distance, original index)` pairs, ascending by distance
    /// then index. Only neighbors within `opts.distance_upper_bound` are
    /// returned; fewer than `k` hits means fewer entries, no padding.
    pub fn query(&self, x: &[f64], k: usize, opts: &QueryOptions) -> Vec<(f64, usize)> {
        debug_assert_eq!(x.len(), self.dim);
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let bound_rd = reduce(opts.distance_upper_bound, opts.p);
        let epsfac = if opts.eps == 0.0 {
            1.0
        } else if opts.p.is_infinite() {
            1.0 / (1.0 + opts.eps)
        } else {
            1.0 / (1.0 + opts.eps).powf(opts.p)
        };

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        self.knn_recursive(0, x, k, opts.p, epsfac, bound_rd, &mut heap);

        let mut hits: Vec<(f64, usize)> = heap
            .into_iter()
            .map(|c| (promote(c.rdist, opts.p), c.index))
            .collect();
        hits.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        hits
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        x: &[f64],
        k: usize,
        p: f64,
        epsfac: f64,
        bound_rd: f64,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        match self.nodes[node_idx] {
            Node::Leaf { start, end } => {
                for slot in start..end {
                    let rd = minkowski_distance_p(x, self.point(slot), p);
                    if rd > bound_rd {
                        continue;
                    }
                    let cand = Candidate {
                        rdist: rd,
                        index: self.indices[slot],
                    };
                    if heap.len() < k {
                        heap.push(cand);
                    } else if heap.peek().is_some_and(|worst| cand < *worst) {
                        heap.pop();
                        heap.push(cand);
                    }
                }
            }
            Node::Split {
                dim,
                value,
                left,
                right,
            } => {
                let diff = x[dim] - value;
                let (near, far) = if diff <= 0.0 { (left, right) } else { (right, left) };
                self.knn_recursive(near, x, k, p, epsfac, bound_rd, heap);

                // The far side is at least |diff| away along the split axis,
                // which lower-bounds any p-norm distance into that region.
                let plane_rd = if p.is_infinite() {
                    diff.abs()
                } else {
                    reduce(diff.abs(), p)
                };
                let mut prune = bound_rd;
                if heap.len() == k {
                    if let Some(worst) = heap.peek() {
                        prune = prune.min(worst.rdist);
                    }
                }
                if plane_rd <= prune * epsfac {
                    self.knn_recursive(far, x, k, p, epsfac, bound_rd, heap);
                }
            }
        }
    }

    /// Find every indexed point within distance `r` of `x`.
    ///
    /// Returns original indices in ascending order.
    pub fn query_ball(&self, x: &[f64], r: f64, opts: &QueryOptions) -> Vec<usize> {
        debug_assert_eq!(x.len(), self.dim);
        let mut results = Vec::new();
        if self.nodes.is_empty() || r < 0.0 {
            return results;
        }
        let r_rd = reduce(r, opts.p);
        // Approximate search skips branches whose nearest possible point
        // is further than r / (1 + eps).
        let prune_r = r / (1.0 + opts.eps);
        self.ball_recursive(0, x, r_rd, prune_r, opts.p, &mut results);
        results.sort_unstable();
        results
    }

    fn ball_recursive(
        &self,
        node_idx: usize,
        x: &[f64],
        r_rd: f64,
        prune_r: f64,
        p: f64,
        results: &mut Vec<usize>,
    ) {
        match self.nodes[node_idx] {
            Node::Leaf { start, end } => {
                for slot in start..end {
                    if minkowski_distance_p(x, self.point(slot), p) <= r_rd {
                        results.push(self.indices[slot]);
                    }
                }
            }
            Node::Split {
                dim,
                value,
                left,
                right,
            } => {
                let diff = x[dim] - value;
                let (near, far) = if diff <= 0.0 { (left, right) } else { (right, left) };
                self.ball_recursive(near, x, r_rd, prune_r, p, results);
                if diff.abs() <= prune_r {
                    self.ball_recursive(far, x, r_rd, prune_r, p, results);
                }
            }
        }
    }
}
