//! # graphspace
//!
//! Spectral toolkit for the analysis of massive graphs, built around two
//! numerical subsystems:
//!
//! - **Graph spectral engine** ([`graph`], [`spectrum`]): a uniform
//!   interface over the algebraic representations of a weighted undirected
//!   graph (adjacency, combinatorial/signless/normalised Laplacians, lazy
//!   random walk), with on-demand matrix synthesis and a partial
//!   eigensolver returning the few smallest or largest eigenpairs.
//! - **CKNS kernel density estimator** ([`kde`], [`lsh`]): a
//!   sublinear-time, locality-sensitive-hashing based estimator for
//!   Gaussian kernel sums over large point sets, with a multi-level
//!   sampling lattice, an adaptive bucket-vs-brute-force strategy and
//!   median variance reduction.
//!
//! Graph matrices are sparse CSR (`sprs::CsMat<f64>`); point sets are
//! dense row-major matrices (`smartcore` `DenseMatrix<f64>`), one point
//! per row.
//!
//! # Design notes
//!
//! - Derived graph matrices are cached in single-use initialisation slots
//!   and never recomputed once built.
//! - All randomised components (KDE sampling, random graph models, solver
//!   start vectors) derive from explicit seeds; no process-global RNG is
//!   consulted, and repeated runs with the same seed are identical.
//! - Construction and query fan out over rayon; all stages emit structured
//!   logs (info/debug/trace) compatible with env_logger or tracing
//!   backends.
//!
//! # Example
//!
//! ```
//! use graphspace::graph_factory::complete_graph;
//! use graphspace::spectrum::{compute_eigenvalues, EigenSortRule, GraphMatrix};
//!
//! let graph = complete_graph(10).unwrap();
//! let eigenvalues = compute_eigenvalues(
//!     &graph,
//!     GraphMatrix::NormalisedLaplacian,
//!     4,
//!     EigenSortRule::Smallest,
//! )
//! .unwrap();
//! assert!(eigenvalues[0].abs() < 1e-6);
//! ```

pub mod data;
pub mod error;
pub mod graph;
pub mod graph_factory;
pub mod kde;
pub mod lanczos;
pub mod local;
pub mod lsh;
pub mod matrix;
pub mod spectrum;

#[cfg(test)]
mod tests;

pub use data::DataPoint;
pub use error::{Error, Result};
pub use graph::{Edge, Graph};
pub use kde::{CknsGaussianKde, ExactGaussianKde};
pub use local::{AdjacencyListLocalGraph, LocalGraph};
pub use spectrum::{
    compute_eigensystem, compute_eigenvalues, power_method, rayleigh_quotient,
    EigenSortRule, EigenSystem, GraphMatrix,
};
