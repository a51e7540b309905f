//! Dense point-set boundary and kernel helpers.
//!
//! A dense `m x d` matrix is viewed as `m` data points of common dimension
//! `d`, one point per row. The kernel density estimators in [`crate::kde`]
//! operate on the extracted rows rather than the matrix itself.

use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// A `d`-dimensional real data point: one row of a dense point-set matrix.
pub type DataPoint = Vec<f64>;

/// Extract the rows of a dense matrix as owned [`DataPoint`]s.
pub fn matrix_to_points(matrix: &DenseMatrix<f64>) -> Vec<DataPoint> {
    let (m, _) = matrix.shape();
    (0..m)
        .map(|i| matrix.get_row(i).iterator(0).copied().collect())
        .collect()
}

/// Squared Euclidean distance between two points of equal dimension.
pub fn squared_distance(u: &[f64], v: &[f64]) -> f64 {
    debug_assert_eq!(u.len(), v.len(), "points must share a dimension");
    u.iter().zip(v.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Gaussian kernel evaluated at squared distance `c`: `exp(-a * c)`.
pub fn gaussian_kernel(a: f64, c: f64) -> f64 {
    (-a * c).exp()
}

/// Gaussian kernel between two points under scale parameter `a`.
pub fn gaussian_kernel_dist(a: f64, u: &[f64], v: &[f64]) -> f64 {
    gaussian_kernel(a, squared_distance(u, v))
}
