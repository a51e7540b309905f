//! Error types shared by every public operation in the crate.
//!
//! Errors are never recovered internally: each public operation either
//! succeeds or fails with one of the kinds below, and a failed constructor
//! leaves no partially-initialised value observable to the caller.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument is outside its documented range: an
    /// eigenpair count outside `[1, n - 1]`, a vertex index outside
    /// `[0, n)`, a dimension mismatch, a zero vector where a direction is
    /// required, or a KDE error parameter outside `(0, 1]`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input violates a structural invariant, e.g. an asymmetric
    /// adjacency matrix at graph construction.
    #[error("domain error: {0}")]
    Domain(String),

    /// An underlying I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A well-formed request could not be completed at runtime: a
    /// malformed adjacency-list line, or a vertex missing from a
    /// file-backed graph.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A numerical backend failed, e.g. the iterative eigensolver did not
    /// converge. Surfaced unchanged, never retried internally.
    #[error("compute error: {0}")]
    Compute(String),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        Error::Domain(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }
}
