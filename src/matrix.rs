//! Sparse matrix utilities shared across the crate.
//!
//! All graph matrices are square, symmetric `CsMat<f64>` in CSR form. This
//! module provides the conversions between raw CSR vectors and `CsMat`, the
//! exact symmetry check used at graph construction, and the
//! adjacency-or-Laplacian disambiguation applied to ambiguous input.

use log::{debug, trace};
use sprs::{CsMat, TriMat};

use crate::error::{Error, Result};

/// Entries with absolute value at or below this threshold are treated as
/// floating-point noise and removed when reconstructing an adjacency matrix.
pub const PRUNE_EPSILON: f64 = 1e-10;

/// Build a CSR matrix from the three parallel CSR vectors: row starts
/// (length `n + 1`), column indices and values.
pub fn from_csr_vectors(
    row_starts: &[usize],
    col_indices: &[usize],
    values: &[f64],
) -> Result<CsMat<f64>> {
    if row_starts.is_empty() {
        return Err(Error::invalid_argument("row starts vector cannot be empty"));
    }
    if col_indices.len() != values.len() {
        return Err(Error::invalid_argument(format!(
            "column index and value vectors must have equal length: {} != {}",
            col_indices.len(),
            values.len()
        )));
    }
    let n = row_starts.len() - 1;
    if *row_starts.last().unwrap_or(&0) != values.len() {
        return Err(Error::invalid_argument(
            "final row start must equal the number of non-zeros",
        ));
    }

    trace!("Assembling {}x{} CSR matrix with {} non-zeros", n, n, values.len());
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for i in 0..n {
        let (start, end) = (row_starts[i], row_starts[i + 1]);
        if start > end || end > values.len() {
            return Err(Error::invalid_argument(format!(
                "row starts vector is not monotone at row {}",
                i
            )));
        }
        for idx in start..end {
            if col_indices[idx] >= n {
                return Err(Error::invalid_argument(format!(
                    "column index {} out of range for {} columns",
                    col_indices[idx], n
                )));
            }
            triplets.add_triplet(i, col_indices[idx], values[idx]);
        }
    }
    Ok(triplets.to_csr())
}

/// Return the three CSR vectors `(row_starts, col_indices, values)` of a
/// matrix, freshly allocated.
pub fn csr_vectors(matrix: &CsMat<f64>) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    let mut row_starts = Vec::with_capacity(matrix.rows() + 1);
    let mut col_indices = Vec::with_capacity(matrix.nnz());
    let mut values = Vec::with_capacity(matrix.nnz());
    row_starts.push(0);
    for row in matrix.outer_iterator() {
        for (j, &v) in row.iter() {
            col_indices.push(j);
            values.push(v);
        }
        row_starts.push(col_indices.len());
    }
    (row_starts, col_indices, values)
}

/// Exact symmetry check: every stored entry `(i, j)` must have an identical
/// mirrored entry `(j, i)`.
pub fn is_symmetric(matrix: &CsMat<f64>) -> bool {
    if matrix.rows() != matrix.cols() {
        return false;
    }
    for (&v, (i, j)) in matrix.iter() {
        if matrix.get(j, i) != Some(&v) {
            trace!("Symmetry violation at ({}, {})", i, j);
            return false;
        }
    }
    true
}

/// Multiply a CSR matrix with a dense vector: `y = M x`.
pub fn mul_vector(matrix: &CsMat<f64>, x: &[f64]) -> Vec<f64> {
    debug_assert_eq!(
        matrix.cols(),
        x.len(),
        "vector length {} must match {} columns",
        x.len(),
        matrix.cols()
    );
    let mut result = vec![0.0; matrix.rows()];
    for (i, row) in matrix.outer_iterator().enumerate() {
        let mut acc = 0.0;
        for (j, &v) in row.iter() {
            acc += v * x[j];
        }
        result[i] = acc;
    }
    result
}

/// Build a diagonal CSR matrix from the given entries. Zeros are stored
/// explicitly so that the diagonal structure is always complete.
pub fn diagonal(entries: &[f64]) -> CsMat<f64> {
    let n = entries.len();
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for (i, &d) in entries.iter().enumerate() {
        triplets.add_triplet(i, i, d);
    }
    triplets.to_csr()
}

/// Given a matrix which is either an adjacency matrix or a Laplacian,
/// return the adjacency matrix of the graph it describes.
///
/// Edge weights are non-negative, so a strictly negative off-diagonal entry
/// identifies the input as a Laplacian. In that case the adjacency is
/// recovered as the negated off-diagonal part, with self-loop weights equal
/// to the row sums of the Laplacian. Entries at or below [`PRUNE_EPSILON`]
/// are dropped so that floating-point residue does not introduce spurious
/// self-loops or edges.
pub fn adjacency_from_adj_or_lap(matrix: &CsMat<f64>) -> CsMat<f64> {
    let n = matrix.rows();
    let found_negative = matrix.iter().any(|(&v, _)| v < 0.0);

    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    if found_negative {
        debug!("Input matrix has negative entries, interpreting as a Laplacian");
        let mut row_sums = vec![0.0; n];
        for (&v, (i, _)) in matrix.iter() {
            row_sums[i] += v;
        }
        for (&v, (i, j)) in matrix.iter() {
            if i != j && -v > PRUNE_EPSILON {
                triplets.add_triplet(i, j, -v);
            }
        }
        // The self-loop weight of vertex i is the i-th row sum of the
        // Laplacian: diag(L) - offdiag row sum = (deg + loop) - deg.
        for (i, &s) in row_sums.iter().enumerate() {
            if s > PRUNE_EPSILON {
                triplets.add_triplet(i, i, s);
            }
        }
    } else {
        for (&v, (i, j)) in matrix.iter() {
            if v > PRUNE_EPSILON {
                triplets.add_triplet(i, j, v);
            }
        }
    }
    triplets.to_csr()
}
