//! Partial eigensystems of graph matrices.
//!
//! Given a graph and a matrix selector, [`compute_eigensystem`] returns the
//! `k` smallest or largest eigenpairs of the chosen representation,
//! delegating to the iterative solver in [`crate::lanczos`]. The companion
//! operators [`rayleigh_quotient`] and [`power_method`] work directly on
//! sparse matrices.
//!
//! Eigenvalue guarantees for the graph matrices: the normalised Laplacian
//! spectrum lies in `[0, 2]`, the combinatorial Laplacian spectrum in
//! `[0, 2 * max_degree]`, and the algebraic multiplicity of eigenvalue 0 of
//! either Laplacian equals the number of connected components.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use smartcore::linalg::basic::arrays::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::CsMat;

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::lanczos;
use crate::matrix::mul_vector;

/// Iteration count used by [`power_method`] when none is given; sufficient
/// for the Rayleigh quotient of the result to approximate the dominant
/// eigenvalue on well-separated spectra.
pub const DEFAULT_POWER_ITERATIONS: usize = 1000;

const POWER_METHOD_SEED: u64 = 0x9f2d_77c1;

/// Selector for the algebraic representation of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMatrix {
    Adjacency,
    Laplacian,
    NormalisedLaplacian,
    SignlessLaplacian,
    NormalisedSignlessLaplacian,
}

/// Which end of the spectrum to extract: the `k` eigenpairs with smallest
/// algebraic value, or with largest absolute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EigenSortRule {
    Smallest,
    Largest,
}

/// Eigenvalues in sorted order together with the matching eigenvectors as
/// the columns of an `n x k` dense matrix.
pub type EigenSystem = (Vec<f64>, DenseMatrix<f64>);

/// Compute the `k` extreme eigenpairs of the selected graph matrix.
///
/// Eigenvalues are returned in ascending order for
/// [`EigenSortRule::Smallest`] and in descending order of magnitude for
/// [`EigenSortRule::Largest`].
///
/// # Errors
///
/// `InvalidArgument` unless `1 <= k <= n - 1` (the iterative solver cannot
/// extract the full spectrum of a sparse operator); `Compute` if the solver
/// fails to converge.
pub fn compute_eigensystem(
    graph: &Graph,
    matrix: GraphMatrix,
    k: usize,
    sort_rule: EigenSortRule,
) -> Result<EigenSystem> {
    let n = graph.number_of_vertices();
    if k < 1 || k >= n {
        return Err(Error::invalid_argument(format!(
            "eigenpair count must lie in [1, {}], got {}",
            n.saturating_sub(1),
            k
        )));
    }

    info!(
        "Computing {} {:?} eigenpairs of the {:?} matrix ({} vertices)",
        k, sort_rule, matrix, n
    );
    let operator = select_matrix(graph, matrix);
    let (eigenvalues, eigenvectors) = lanczos::eigsh(operator, k, sort_rule)?;
    debug!("Eigenvalues: {:?}", eigenvalues);

    // Pack the eigenvectors as columns of an n x k dense matrix.
    let mut flat = Vec::with_capacity(n * k);
    for i in 0..n {
        for vector in &eigenvectors {
            flat.push(vector[i]);
        }
    }
    Ok((eigenvalues, DenseMatrix::from_iterator(flat.into_iter(), n, k, 0)))
}

/// Compute only the `k` extreme eigenvalues of the selected graph matrix.
pub fn compute_eigenvalues(
    graph: &Graph,
    matrix: GraphMatrix,
    k: usize,
    sort_rule: EigenSortRule,
) -> Result<Vec<f64>> {
    compute_eigensystem(graph, matrix, k, sort_rule).map(|(values, _)| values)
}

/// Rayleigh quotient `R(M, x) = x^T M x / x^T x`.
///
/// # Errors
///
/// `InvalidArgument` on a dimension mismatch or a zero vector.
pub fn rayleigh_quotient(matrix: &CsMat<f64>, x: &[f64]) -> Result<f64> {
    if x.len() != matrix.cols() {
        return Err(Error::invalid_argument(format!(
            "vector length {} must match matrix dimension {}",
            x.len(),
            matrix.cols()
        )));
    }
    let denominator: f64 = x.iter().map(|&v| v * v).sum();
    if denominator == 0.0 {
        return Err(Error::invalid_argument(
            "rayleigh quotient is undefined for the zero vector",
        ));
    }
    let mx = mul_vector(matrix, x);
    let numerator: f64 = x.iter().zip(mx.iter()).map(|(a, b)| a * b).sum();
    Ok(numerator / denominator)
}

/// Run `iterations` iterations of the power method `x <- M x / ||M x||`,
/// returning the final unit vector.
///
/// With `iterations` of zero the initial vector is returned unchanged. When
/// no iteration count is given, [`DEFAULT_POWER_ITERATIONS`] is used; when
/// no initial vector is given, a deterministic random unit vector is used.
/// Negative iteration counts are unrepresentable by construction.
///
/// # Errors
///
/// `InvalidArgument` if the initial vector length does not match the
/// matrix; `Compute` if an iterate vanishes (e.g. on the zero matrix).
pub fn power_method(
    matrix: &CsMat<f64>,
    iterations: Option<usize>,
    initial_vector: Option<Vec<f64>>,
) -> Result<Vec<f64>> {
    let n = matrix.cols();
    let iterations = iterations.unwrap_or(DEFAULT_POWER_ITERATIONS);

    let mut x = match initial_vector {
        Some(x) => {
            if x.len() != n {
                return Err(Error::invalid_argument(format!(
                    "initial vector length {} must match matrix dimension {}",
                    x.len(),
                    n
                )));
            }
            x
        }
        None => random_unit_vector(n),
    };

    debug!("Power method: {} iterations on {}x{} matrix", iterations, n, n);
    for _ in 0..iterations {
        let y = mul_vector(matrix, &x);
        let norm = y.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(Error::Compute(
                "power method iterate vanished".into(),
            ));
        }
        x = y.into_iter().map(|v| v / norm).collect();
    }
    Ok(x)
}

fn select_matrix(graph: &Graph, matrix: GraphMatrix) -> &CsMat<f64> {
    match matrix {
        GraphMatrix::Adjacency => graph.adjacency(),
        GraphMatrix::Laplacian => graph.laplacian(),
        GraphMatrix::NormalisedLaplacian => graph.normalised_laplacian(),
        GraphMatrix::SignlessLaplacian => graph.signless_laplacian(),
        GraphMatrix::NormalisedSignlessLaplacian => graph.normalised_signless_laplacian(),
    }
}

fn random_unit_vector(n: usize) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(POWER_METHOD_SEED);
    let mut x: Vec<f64> = (0..n).map(|_| StandardNormal.sample(&mut rng)).collect();
    let norm = x.iter().map(|&v| v * v).sum::<f64>().sqrt();
    for v in &mut x {
        *v /= norm;
    }
    x
}
