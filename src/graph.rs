//! Weighted undirected graphs backed by a sparse adjacency matrix.
//!
//! A [`Graph`] owns exactly one symmetric, non-negative `CsMat<f64>`
//! adjacency matrix. Seven derived matrices (degree, inverse degree,
//! combinatorial and signless Laplacians, their normalised variants, and
//! the lazy random walk matrix) are synthesised on first access and cached
//! for the lifetime of the graph.
//!
//! Diagonal entries of the adjacency matrix are self-loop weights. A
//! self-loop contributes twice to the weighted degree of its vertex, and is
//! reflected in the degree but not in the neighbour edge list.
//!
//! # Construction from ambiguous input
//!
//! The constructors accept a matrix which may be either an adjacency matrix
//! or a Laplacian: a strictly negative off-diagonal entry identifies a
//! Laplacian, from which the adjacency is reconstructed. See
//! [`crate::matrix::adjacency_from_adj_or_lap`].
//!
//! # Thread safety
//!
//! Each derived matrix lives in a single-use initialisation slot, so first
//! access from concurrent threads is safe; pre-warming the matrices you
//! need before sharing the graph avoids redundant synchronisation.

use std::fmt;
use std::sync::OnceLock;

use log::{debug, info, trace};
use sprs::{CsMat, TriMat};

use crate::error::{Error, Result};
use crate::matrix;

/// A weighted edge between `v1` and `v2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub v1: usize,
    pub v2: usize,
    pub weight: f64,
}

/// A weighted undirected graph, owning its adjacency matrix and lazily
/// caching the derived matrices.
#[derive(Debug)]
pub struct Graph {
    adjacency: CsMat<f64>,
    number_of_vertices: usize,
    has_self_loops: bool,

    degree: OnceLock<CsMat<f64>>,
    inverse_degree: OnceLock<CsMat<f64>>,
    laplacian: OnceLock<CsMat<f64>>,
    signless_laplacian: OnceLock<CsMat<f64>>,
    normalised_laplacian: OnceLock<CsMat<f64>>,
    normalised_signless_laplacian: OnceLock<CsMat<f64>>,
    lazy_random_walk: OnceLock<CsMat<f64>>,
}

impl Graph {
    /// Construct a graph from a sparse matrix which is either an adjacency
    /// matrix or a Laplacian.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the matrix is not square; `Domain` if the
    /// resulting adjacency matrix is not symmetric.
    pub fn new(matrix: CsMat<f64>) -> Result<Self> {
        if matrix.rows() != matrix.cols() {
            return Err(Error::invalid_argument(format!(
                "adjacency matrix must be square, got {}x{}",
                matrix.rows(),
                matrix.cols()
            )));
        }

        let adjacency = matrix::adjacency_from_adj_or_lap(&matrix);
        if !matrix::is_symmetric(&adjacency) {
            return Err(Error::domain("graph adjacency matrix must be symmetric"));
        }

        let number_of_vertices = adjacency.rows();
        let has_self_loops =
            (0..number_of_vertices).any(|i| adjacency.get(i, i).is_some_and(|&v| v != 0.0));

        debug!(
            "Constructed graph: {} vertices, {} non-zeros, self-loops: {}",
            number_of_vertices,
            adjacency.nnz(),
            has_self_loops
        );

        Ok(Self {
            adjacency,
            number_of_vertices,
            has_self_loops,
            degree: OnceLock::new(),
            inverse_degree: OnceLock::new(),
            laplacian: OnceLock::new(),
            signless_laplacian: OnceLock::new(),
            normalised_laplacian: OnceLock::new(),
            normalised_signless_laplacian: OnceLock::new(),
            lazy_random_walk: OnceLock::new(),
        })
    }

    /// Construct a graph from the three CSR vectors of an adjacency or
    /// Laplacian matrix: row starts (length `n + 1`), column indices and
    /// values.
    pub fn from_csr_vectors(
        row_starts: &[usize],
        col_indices: &[usize],
        values: &[f64],
    ) -> Result<Self> {
        let matrix = matrix::from_csr_vectors(row_starts, col_indices, values)?;
        Self::new(matrix)
    }

    // -------------------- Matrix accessors --------------------

    /// The adjacency matrix `A`.
    pub fn adjacency(&self) -> &CsMat<f64> {
        &self.adjacency
    }

    /// The degree matrix `D`: diagonal, with `D[v, v]` equal to the
    /// weighted degree of `v`. A self-loop contributes twice.
    pub fn degree_matrix(&self) -> &CsMat<f64> {
        self.degree.get_or_init(|| {
            trace!("Materialising degree matrix");
            matrix::diagonal(&self.degree_vector())
        })
    }

    /// The inverse degree matrix `D^-1`.
    ///
    /// Rows of degree-zero vertices hold non-finite values; graphs with
    /// isolated vertices are a caller error for this matrix.
    pub fn inverse_degree_matrix(&self) -> &CsMat<f64> {
        self.inverse_degree.get_or_init(|| {
            trace!("Materialising inverse degree matrix");
            let inv: Vec<f64> = self.degree_vector().iter().map(|&d| 1.0 / d).collect();
            matrix::diagonal(&inv)
        })
    }

    /// The combinatorial Laplacian `L = D - A`.
    pub fn laplacian(&self) -> &CsMat<f64> {
        self.laplacian.get_or_init(|| {
            trace!("Materialising combinatorial Laplacian");
            self.degree_matrix() - &self.adjacency
        })
    }

    /// The signless Laplacian `|L| = D + A`.
    pub fn signless_laplacian(&self) -> &CsMat<f64> {
        self.signless_laplacian.get_or_init(|| {
            trace!("Materialising signless Laplacian");
            self.degree_matrix() + &self.adjacency
        })
    }

    /// The normalised Laplacian `L_n = I - D^(-1/2) A D^(-1/2)`.
    ///
    /// Graphs with isolated vertices are a caller error: the corresponding
    /// rows hold non-finite values.
    pub fn normalised_laplacian(&self) -> &CsMat<f64> {
        self.normalised_laplacian.get_or_init(|| {
            trace!("Materialising normalised Laplacian");
            let norm_adj = self.degree_normalised_adjacency();
            &CsMat::<f64>::eye(self.number_of_vertices) - &norm_adj
        })
    }

    /// The normalised signless Laplacian `|L_n| = I + D^(-1/2) A D^(-1/2)`.
    pub fn normalised_signless_laplacian(&self) -> &CsMat<f64> {
        self.normalised_signless_laplacian.get_or_init(|| {
            trace!("Materialising normalised signless Laplacian");
            let norm_adj = self.degree_normalised_adjacency();
            &CsMat::<f64>::eye(self.number_of_vertices) + &norm_adj
        })
    }

    /// The lazy random walk matrix `W = (1/2) I + (1/2) A D^-1`.
    pub fn lazy_random_walk_matrix(&self) -> &CsMat<f64> {
        self.lazy_random_walk.get_or_init(|| {
            trace!("Materialising lazy random walk matrix");
            let walk = (&self.adjacency * self.inverse_degree_matrix()).map(|&v| 0.5 * v);
            let half_identity = CsMat::eye(self.number_of_vertices).map(|&v: &f64| 0.5 * v);
            &half_identity + &walk
        })
    }

    // -------------------- Global queries --------------------

    /// Total volume of the graph: the sum of all weighted degrees.
    pub fn total_volume(&self) -> f64 {
        self.degree_matrix().iter().map(|(&v, _)| v).sum()
    }

    /// Average weighted degree: `total_volume() / n`.
    pub fn average_degree(&self) -> f64 {
        self.total_volume() / self.number_of_vertices as f64
    }

    pub fn number_of_vertices(&self) -> usize {
        self.number_of_vertices
    }

    /// Number of edges. Each self-loop counts as a single edge.
    pub fn number_of_edges(&self) -> usize {
        let mut nnz = self.adjacency.nnz();
        if self.has_self_loops {
            // Off-diagonal entries appear twice in the matrix, diagonal
            // entries once: double-count the diagonal before halving.
            nnz += (0..self.number_of_vertices)
                .filter(|&i| self.adjacency.get(i, i).is_some_and(|&v| v != 0.0))
                .count();
        }
        nnz / 2
    }

    pub fn has_self_loops(&self) -> bool {
        self.has_self_loops
    }

    // -------------------- Local queries --------------------

    /// Weighted degree of `v`. A self-loop contributes twice.
    pub fn degree(&self, v: usize) -> Result<f64> {
        self.check_vertex_argument(v)?;
        Ok(*self.degree_matrix().get(v, v).unwrap_or(&0.0))
    }

    /// Unweighted (combinatorial) degree of `v`: the number of incident
    /// edge endpoints, with a self-loop counting twice.
    pub fn degree_unweighted(&self, v: usize) -> Result<usize> {
        self.check_vertex_argument(v)?;
        let row_nnz = self.adjacency.outer_view(v).map_or(0, |row| row.nnz());
        let self_loop = usize::from(self.adjacency.get(v, v).is_some_and(|&w| w != 0.0));
        Ok(row_nnz + self_loop)
    }

    /// Weighted degrees of a batch of vertices.
    pub fn degrees(&self, vertices: &[usize]) -> Result<Vec<f64>> {
        vertices.iter().map(|&v| self.degree(v)).collect()
    }

    /// Unweighted degrees of a batch of vertices.
    pub fn degrees_unweighted(&self, vertices: &[usize]) -> Result<Vec<usize>> {
        vertices.iter().map(|&v| self.degree_unweighted(v)).collect()
    }

    /// Edges incident to `v`, excluding any self-loop. Self-loops are
    /// reflected in the degree but not in the neighbour edge list.
    pub fn neighbors(&self, v: usize) -> Result<Vec<Edge>> {
        self.check_vertex_argument(v)?;
        let mut edges = Vec::new();
        if let Some(row) = self.adjacency.outer_view(v) {
            for (u, &w) in row.iter() {
                if u != v && w != 0.0 {
                    edges.push(Edge { v1: v, v2: u, weight: w });
                }
            }
        }
        Ok(edges)
    }

    /// Neighbour vertex ids of `v`, excluding any self-loop.
    pub fn neighbors_unweighted(&self, v: usize) -> Result<Vec<usize>> {
        self.check_vertex_argument(v)?;
        let mut ids = Vec::new();
        if let Some(row) = self.adjacency.outer_view(v) {
            for (u, &w) in row.iter() {
                if u != v && w != 0.0 {
                    ids.push(u);
                }
            }
        }
        Ok(ids)
    }

    pub fn vertex_exists(&self, v: usize) -> bool {
        v < self.number_of_vertices
    }

    // -------------------- Derived graphs --------------------

    /// The subgraph induced by the given vertices. Duplicate ids are
    /// ignored; vertex ids are remapped to `[0, m)` in first-occurrence
    /// order.
    pub fn subgraph(&self, vertices: &[usize]) -> Result<Graph> {
        let mut old_to_new = std::collections::HashMap::new();
        let mut ordered = Vec::new();
        for &v in vertices {
            self.check_vertex_argument(v)?;
            if !old_to_new.contains_key(&v) {
                old_to_new.insert(v, ordered.len());
                ordered.push(v);
            }
        }

        info!(
            "Building induced subgraph on {} of {} vertices",
            ordered.len(),
            self.number_of_vertices
        );

        let m = ordered.len();
        let mut triplets: TriMat<f64> = TriMat::new((m, m));
        for (new_i, &old_i) in ordered.iter().enumerate() {
            if let Some(row) = self.adjacency.outer_view(old_i) {
                for (old_j, &w) in row.iter() {
                    if let Some(&new_j) = old_to_new.get(&old_j) {
                        triplets.add_triplet(new_i, new_j, w);
                    }
                }
            }
        }
        Graph::new(triplets.to_csr())
    }

    /// The disjoint union of this graph and `other`: a graph on `n + n'`
    /// vertices with block-diagonal adjacency.
    pub fn disjoint_union(&self, other: &Graph) -> Result<Graph> {
        let (mut row_starts, mut col_indices, mut values) =
            matrix::csr_vectors(&self.adjacency);
        let (other_starts, other_indices, other_values) =
            matrix::csr_vectors(other.adjacency());

        let nnz_offset = values.len();
        let vertex_offset = self.number_of_vertices;
        for &s in other_starts.iter().skip(1) {
            row_starts.push(s + nnz_offset);
        }
        for &j in &other_indices {
            col_indices.push(j + vertex_offset);
        }
        values.extend_from_slice(&other_values);

        debug!(
            "Disjoint union: {} + {} vertices, {} + {} edges",
            self.number_of_vertices,
            other.number_of_vertices,
            self.number_of_edges(),
            other.number_of_edges()
        );
        Graph::from_csr_vectors(&row_starts, &col_indices, &values)
    }

    // -------------------- Internals --------------------

    fn check_vertex_argument(&self, v: usize) -> Result<()> {
        if v >= self.number_of_vertices {
            return Err(Error::invalid_argument(format!(
                "vertex index {} out of range for {} vertices",
                v, self.number_of_vertices
            )));
        }
        Ok(())
    }

    /// Weighted degrees of all vertices: row sums of the adjacency matrix
    /// plus the diagonal, so that each self-loop contributes twice.
    fn degree_vector(&self) -> Vec<f64> {
        let mut degrees = vec![0.0; self.number_of_vertices];
        for (&v, (i, j)) in self.adjacency.iter() {
            degrees[i] += v;
            if i == j {
                degrees[i] += v;
            }
        }
        degrees
    }

    /// `D^(-1/2) A D^(-1/2)`, the common factor of both normalised
    /// Laplacians.
    fn degree_normalised_adjacency(&self) -> CsMat<f64> {
        let inv_sqrt: Vec<f64> =
            self.degree_vector().iter().map(|&d| 1.0 / d.sqrt()).collect();
        let scale = matrix::diagonal(&inv_sqrt);
        &(&scale * &self.adjacency) * &scale
    }
}

impl Clone for Graph {
    /// Clones the adjacency matrix; derived matrices are re-synthesised
    /// lazily on the clone.
    fn clone(&self) -> Self {
        Self {
            adjacency: self.adjacency.clone(),
            number_of_vertices: self.number_of_vertices,
            has_self_loops: self.has_self_loops,
            degree: OnceLock::new(),
            inverse_degree: OnceLock::new(),
            laplacian: OnceLock::new(),
            signless_laplacian: OnceLock::new(),
            normalised_laplacian: OnceLock::new(),
            normalised_signless_laplacian: OnceLock::new(),
            lazy_random_walk: OnceLock::new(),
        }
    }
}

impl PartialEq for Graph {
    /// Two graphs are equal when their adjacency matrices have identical
    /// CSR structure and values.
    fn eq(&self, other: &Self) -> bool {
        matrix::csr_vectors(&self.adjacency) == matrix::csr_vectors(&other.adjacency)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph({} vertices, {} edges{})",
            self.number_of_vertices,
            self.number_of_edges(),
            if self.has_self_loops { ", with self-loops" } else { "" }
        )
    }
}
