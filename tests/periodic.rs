//! Integration tests for periodic neighbor search.
//!
//! The reference oracle is a brute-force scan under the minimum-image
//! convention, which agrees with image-based search whenever the radius
//! stays within half the smallest periodic box edge.

use approx::assert_relative_eq;
use pbctree::{
    count_neighbors, nearest_neighbors, NeighborHits, PeriodicBox, PeriodicKdTree, PeriodicSpec,
    QueryOptions,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Euclidean distance under the minimum-image convention.
fn minimum_image_distance(a: &[f64], b: &[f64], sizes: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 0..a.len() {
        let mut d = a[i] - b[i];
        if sizes[i] > 0.0 {
            d -= (d / sizes[i]).round() * sizes[i];
        }
        sum += d * d;
    }
    sum.sqrt()
}

fn random_points(rng: &mut StdRng, n: usize, sizes: &[f64]) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| {
            sizes
                .iter()
                .map(|&s| {
                    let span = if s > 0.0 { s } else { 10.0 };
                    rng.gen_range(-span..2.0 * span)
                })
                .collect()
        })
        .collect()
}

#[test]
fn ball_queries_match_minimum_image_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x0b0c);
    for sizes in [vec![8.0, 8.0, 8.0], vec![6.0, 9.0, -1.0], vec![-1.0, -1.0, -1.0]] {
        let points = random_points(&mut rng, 250, &sizes);
        let tree = PeriodicKdTree::new(PeriodicBox::new(sizes.clone()), &points).unwrap();
        let opts = QueryOptions::default();

        for _ in 0..60 {
            let x: Vec<f64> = sizes
                .iter()
                .map(|&s| rng.gen_range(-2.0..if s > 0.0 { s + 2.0 } else { 12.0 }))
                .collect();
            let r = rng.gen_range(0.2..2.9);
            let hits = tree.query_ball_point(&x, r, &opts).unwrap();

            let expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| minimum_image_distance(&x, p, &sizes) <= r)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(hits, expected, "box {:?} query {:?} r {}", sizes, x, r);
        }
    }
}

#[test]
fn knn_queries_match_minimum_image_brute_force() {
    let mut rng = StdRng::seed_from_u64(0xca11);
    let sizes = vec![7.0, 11.0, 9.0];
    let points = random_points(&mut rng, 200, &sizes);
    let tree = PeriodicKdTree::new(PeriodicBox::new(sizes.clone()), &points).unwrap();
    let opts = QueryOptions::default();
    let cap = tree.max_distance_upper_bound();
    assert_relative_eq!(cap, 3.5);

    for _ in 0..50 {
        let x: Vec<f64> = sizes.iter().map(|&s| rng.gen_range(0.0..s)).collect();
        let k = rng.gen_range(1..8);
        let hits = tree.query(&x, k, &opts).unwrap();
        assert_eq!(hits.len(), k);

        let mut expected: Vec<(f64, usize)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (minimum_image_distance(&x, p, &sizes), i))
            .filter(|&(d, _)| d <= cap)
            .collect();
        expected.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));
        expected.truncate(k);

        for (hit, (d, i)) in hits.iter().zip(&expected) {
            assert_eq!(hit.index, *i);
            assert_relative_eq!(hit.distance, *d, max_relative = 1e-10);
        }
        for hit in hits.iter().skip(expected.len()) {
            assert!(hit.distance.is_infinite());
            assert_eq!(hit.index, tree.len());
        }
    }
}

#[test]
fn wrapped_pair_is_found_through_the_boundary() {
    // The canonical two-point scenario: 0.1 and 9.9 along x in a cubic
    // box of 10 are 0.2 apart through the wall.
    let points = vec![vec![0.1, 0.0, 0.0], vec![9.9, 0.0, 0.0]];
    let tree = PeriodicKdTree::new(PeriodicBox::new(vec![10.0, 10.0, 10.0]), &points).unwrap();
    let opts = QueryOptions::default();

    let hits = tree.query_ball_point(&[0.0, 0.0, 0.0], 0.5, &opts).unwrap();
    assert_eq!(hits, vec![0, 1]);

    let neighbors = tree.query(&points[0], 2, &opts).unwrap();
    assert_eq!(neighbors[1].index, 1);
    assert_relative_eq!(neighbors[1].distance, 0.2, max_relative = 1e-12);

    // Without periodicity the pair separates.
    let open = PeriodicKdTree::new(PeriodicBox::new(vec![-1.0, -1.0, -1.0]), &points).unwrap();
    let hits = open.query_ball_point(&[0.0, 0.0, 0.0], 0.5, &opts).unwrap();
    assert_eq!(hits, vec![0]);
}

#[test]
fn higher_p_norms_see_through_the_boundary() {
    let points = vec![vec![9.8, 9.8, 0.0]];
    let tree = PeriodicKdTree::new(PeriodicBox::new(vec![10.0, 10.0, 10.0]), &points).unwrap();

    let manhattan = QueryOptions { p: 1.0, ..QueryOptions::default() };
    let neighbors = tree.query(&[0.0, 0.0, 0.0], 1, &manhattan).unwrap();
    assert_relative_eq!(neighbors[0].distance, 0.4, max_relative = 1e-12);

    let chebyshev = QueryOptions { p: f64::INFINITY, ..QueryOptions::default() };
    let neighbors = tree.query(&[0.0, 0.0, 0.0], 1, &chebyshev).unwrap();
    assert_relative_eq!(neighbors[0].distance, 0.2, max_relative = 1e-12);
}

#[test]
fn facade_finds_solvation_shell() {
    // A "solute" surrounded by six "solvent" points, two of them only
    // through periodic wrapping.
    let solute = vec![vec![0.0, 0.0, 0.0]];
    let solvent = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.2, 0.0],
        vec![0.0, 0.0, 0.9],
        vec![9.2, 0.0, 0.0],  // 0.8 through the wall
        vec![0.0, 9.0, 0.0],  // 1.0 through the wall
        vec![4.0, 4.0, 4.0],  // out of range
    ];
    let spec = PeriodicSpec::Lengths(vec![10.0, 10.0, 10.0]);

    match nearest_neighbors(&solute, &solvent, &spec, Some(1.5), None).unwrap() {
        NeighborHits::Radius { indices, coords } => {
            assert_eq!(indices, vec![vec![0, 1, 2, 3, 4]]);
            assert_eq!(coords[0].len(), 5);
            assert_eq!(coords[0][3], solvent[3]);
        }
        other => panic!("expected radius hits, got {:?}", other),
    }

    assert_eq!(count_neighbors(&solute, &solvent, &spec, 1.5).unwrap(), vec![5]);

    match nearest_neighbors(&solute, &solvent, &spec, None, Some(3)).unwrap() {
        NeighborHits::Nearest { distances, indices } => {
            assert_eq!(indices, vec![vec![3, 2, 0]]);
            assert_relative_eq!(distances[0][0], 0.8, max_relative = 1e-12);
            assert_relative_eq!(distances[0][1], 0.9, max_relative = 1e-12);
            assert_relative_eq!(distances[0][2], 1.0, max_relative = 1e-12);
        }
        other => panic!("expected nearest hits, got {:?}", other),
    }
}

#[test]
fn facade_accepts_box_matrix() {
    let solute = vec![vec![0.0, 0.0, 0.0]];
    let solvent = vec![vec![9.9, 0.0, 0.0]];
    let spec = PeriodicSpec::Matrix(vec![
        vec![10.0, 0.0, 0.0],
        vec![0.0, 10.0, 0.0],
        vec![0.0, 0.0, 10.0],
    ]);
    assert_eq!(count_neighbors(&solute, &solvent, &spec, 0.5).unwrap(), vec![1]);
}

#[test]
fn batched_queries_are_consistent_under_load() {
    let mut rng = StdRng::seed_from_u64(0xbeef);
    let sizes = vec![12.0, 12.0, 12.0];
    let points = random_points(&mut rng, 500, &sizes);
    let queries = random_points(&mut rng, 64, &sizes);
    let tree = PeriodicKdTree::new(PeriodicBox::new(sizes), &points).unwrap();
    let opts = QueryOptions::default();

    let knn = tree.query_batch(&queries, 4, &opts).unwrap();
    let balls = tree.query_ball_point_batch(&queries, 2.0, &opts).unwrap();
    assert_eq!(knn.len(), queries.len());
    assert_eq!(balls.len(), queries.len());
    for (q, (nbrs, ball)) in queries.iter().zip(knn.iter().zip(&balls)) {
        assert_eq!(nbrs, &tree.query(q, 4, &opts).unwrap());
        assert_eq!(ball, &tree.query_ball_point(q, 2.0, &opts).unwrap());
    }
}
