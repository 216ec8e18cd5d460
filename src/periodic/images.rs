//! Ghost-image generation for periodic queries
//!
//! A query sphere near a box face also sees points on the opposite side of
//! the cell. Rather than wrapping per-pair distances, the periodic index
//! replays each query once per relevant translated copy ("image") of the
//! query point against the canonicalized data.

use crate::periodic::cell::PeriodicBox;

/// Produce every periodic image of `x` whose distance to some point inside
/// the canonical cell could fall within `distance_upper_bound`.
///
/// The point is wrapped into the canonical cell first; the wrapped
/// original is always the first entry. For each periodic axis a `+size`
/// translate is added when the wrapped coordinate is within the bound of
/// the lower face and a `-size` translate when within the bound of the
/// upper face, applied to every image generated for earlier axes. With an
/// infinite bound all three translates are taken per axis, giving the full
/// 3^k enumeration over k periodic axes.
///
/// The face gating is only sufficient because callers cap the bound at
/// half the smallest periodic edge: under that cap a query sphere can
/// cross at most one image of each face per axis.
pub fn relevant_images(
    x: &[f64],
    bounds: &PeriodicBox,
    distance_upper_bound: f64,
) -> Vec<Vec<f64>> {
    let wrapped = bounds.wrap_point(x);
    let mut images = vec![wrapped.clone()];

    for axis in 0..bounds.ndim() {
        let size = match bounds.periodic_size(axis) {
            Some(size) => size,
            None => continue,
        };

        if distance_upper_bound.is_infinite() {
            let mut expanded = Vec::with_capacity(images.len() * 3);
            for image in &images {
                let mut up = image.clone();
                up[axis] += size;
                let mut down = image.clone();
                down[axis] -= size;
                expanded.push(image.clone());
                expanded.push(up);
                expanded.push(down);
            }
            images = expanded;
        } else {
            let coordinate = wrapped[axis];
            let mut extra = Vec::new();
            // Near the lower face: the sphere pokes out below, so the data
            // it would see there sits one box length up.
            if coordinate.abs() < distance_upper_bound {
                extra.extend(images.iter().map(|image| {
                    let mut translated = image.clone();
                    translated[axis] += size;
                    translated
                }));
            }
            if (size - coordinate).abs() < distance_upper_bound {
                extra.extend(images.iter().map(|image| {
                    let mut translated = image.clone();
                    translated[axis] -= size;
                    translated
                }));
            }
            images.extend(extra);
        }
    }

    images
}
