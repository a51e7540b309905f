use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::data::{gaussian_kernel, gaussian_kernel_dist, matrix_to_points, squared_distance};

/// Sample `n` points from the standard Gaussian in `d` dimensions.
pub fn make_gaussian(n: usize, d: usize, seed: u64) -> DenseMatrix<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> =
        (0..n).map(|_| (0..d).map(|_| StandardNormal.sample(&mut rng)).collect()).collect();
    DenseMatrix::from_2d_vec(&rows).unwrap()
}

#[test]
fn test_squared_distance() {
    assert_eq!(squared_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    assert_eq!(squared_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
}

#[test]
fn test_gaussian_kernel_values() {
    assert_eq!(gaussian_kernel(1.0, 0.0), 1.0);
    approx::assert_abs_diff_eq!(gaussian_kernel(1.0, 1.0), (-1.0f64).exp(), epsilon = 1e-15);
    approx::assert_abs_diff_eq!(gaussian_kernel(2.0, 3.0), (-6.0f64).exp(), epsilon = 1e-15);

    let u = [0.0, 0.0];
    let v = [1.0, 0.0];
    approx::assert_abs_diff_eq!(
        gaussian_kernel_dist(1.0, &u, &v),
        (-1.0f64).exp(),
        epsilon = 1e-15
    );
}

#[test]
fn test_matrix_to_points_shape() {
    let matrix = make_gaussian(7, 3, 42);
    let points = matrix_to_points(&matrix);
    assert_eq!(points.len(), 7);
    assert!(points.iter().all(|p| p.len() == 3));
    assert_eq!(points[2][1], *matrix.get((2, 1)));
}
