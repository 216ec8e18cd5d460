//! Orthogonal simulation box with per-axis periodicity

/// An axis-aligned simulation box.
///
/// Each axis carries a size; a size <= 0 (or NaN) marks that axis as
/// non-periodic. Coordinates along periodic axes are canonicalized into
/// `[0, size)`; non-periodic axes pass through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicBox {
    sizes: Vec<f64>,
}

impl PeriodicBox {
    pub fn new(sizes: Vec<f64>) -> Self {
        PeriodicBox { sizes }
    }

    /// Spatial dimensionality of the box.
    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    /// Raw per-axis sizes, including non-periodic markers.
    pub fn sizes(&self) -> &[f64] {
        &self.sizes
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.sizes[axis] > 0.0
    }

    /// Box edge length along `axis`, or None if the axis is non-periodic.
    pub fn periodic_size(&self, axis: usize) -> Option<f64> {
        let size = self.sizes[axis];
        if size > 0.0 {
            Some(size)
        } else {
            None
        }
    }

    /// Map one coordinate into the canonical cell `[0, size)`.
    #[inline]
    pub fn wrap_coordinate(&self, value: f64, axis: usize) -> f64 {
        match self.periodic_size(axis) {
            Some(size) => {
                let wrapped = value - (value / size).floor() * size;
                // Floating point can land exactly on the upper face.
                if wrapped >= size {
                    0.0
                } else {
                    wrapped
                }
            }
            None => value,
        }
    }

    /// Map a full point into the canonical cell.
    pub fn wrap_point(&self, point: &[f64]) -> Vec<f64> {
        debug_assert_eq!(point.len(), self.ndim());
        point
            .iter()
            .enumerate()
            .map(|(axis, &v)| self.wrap_coordinate(v, axis))
            .collect()
    }

    /// Largest usable query radius: half the smallest periodic edge.
    ///
    /// Any larger radius could see two distinct periodic images of the
    /// same point, so the periodic index caps every query at this value.
    /// Infinite when no axis is periodic.
    pub fn max_distance_upper_bound(&self) -> f64 {
        self.sizes
            .iter()
            .filter(|&&s| s > 0.0)
            .map(|&s| 0.5 * s)
            .fold(f64::INFINITY, f64::min)
    }
}
