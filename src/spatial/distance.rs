//! Minkowski distance calculations
//!
//! Queries work internally in "reduced" distances to avoid roots:
//! sum(|d_i|^p) for finite p, max(|d_i|) for p = infinity. For p = 2 the
//! reduced distance is the familiar squared Euclidean distance.

/// Reduced Minkowski distance between two points of equal dimensionality.
#[inline]
pub fn minkowski_distance_p(a: &[f64], b: &[f64], p: f64) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if p == 2.0 {
        // Fast path: squared Euclidean
        let mut sum = 0.0;
        for (x, y) in a.iter().zip(b) {
            let d = x - y;
            sum += d * d;
        }
        sum
    } else if p.is_infinite() {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    } else if p == 1.0 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    } else {
        a.iter().zip(b).map(|(x, y)| (x - y).abs().powf(p)).sum()
    }
}

/// Actual Minkowski distance between two points.
#[inline]
pub fn minkowski_distance(a: &[f64], b: &[f64], p: f64) -> f64 {
    promote(minkowski_distance_p(a, b, p), p)
}

/// Convert an actual distance to its reduced form.
#[inline]
pub fn reduce(distance: f64, p: f64) -> f64 {
    if p.is_infinite() || p == 1.0 || distance.is_infinite() {
        distance
    } else if p == 2.0 {
        distance * distance
    } else {
        distance.powf(p)
    }
}

/// Convert a reduced distance back to an actual distance.
#[inline]
pub fn promote(reduced: f64, p: f64) -> f64 {
    if p.is_infinite() || p == 1.0 || reduced.is_infinite() {
        reduced
    } else if p == 2.0 {
        reduced.sqrt()
    } else {
        reduced.powf(1.0 / p)
    }
}
