//! Unified error types for the multinet-core crate.
//!
//! All public-facing errors are collected here so callers can match on a
//! single enum, following the error taxonomy of §7: lookups and structural
//! mutations fail with [`Error::NotFound`] / [`Error::AlreadyExists`],
//! out-of-range hyperparameters fail with [`Error::InvalidArgument`], and
//! iterative numeric procedures that hit their cap fail with
//! [`Error::NumericFailure`] instead of looping forever.

use thiserror::Error;

/// Top-level error type for the multinet-core crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Reference to a non-existing actor, layer, node, edge, or attribute.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate declaration of an attribute name (or other component).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A parameter is outside its declared range (γ<0, ε∉[0,1], k<2, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An iterative numeric procedure did not converge within its cap.
    ///
    /// Carries the iteration count reached so the caller can retry with
    /// looser parameters, per §7.
    #[error("numeric failure in {stage}: did not converge after {iterations} iterations")]
    NumericFailure {
        /// Name of the stage that failed to converge (e.g. "lart::power_iteration").
        stage: &'static str,
        /// Number of iterations completed before giving up.
        iterations: u64,
    },

    /// Allocation for a matrix build or a dense distance matrix failed.
    #[error("out of memory while building {0}")]
    OutOfMemory(String),

    /// An operation was cancelled by the caller's [`crate::worker::ProgressMonitor`].
    #[error("operation cancelled")]
    Cancelled(#[from] crate::worker::CancelledError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
