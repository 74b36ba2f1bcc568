use thiserror::Error;

/// Errors raised by the clustering core.
///
/// Every variant is fatal for the run: per-image failures are handled while
/// acquiring embeddings and never reach this type.
#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    /// No vectors were supplied.
    #[error("empty input: no embeddings to cluster")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Vectors in one run have inconsistent dimensionality.
    #[error("dimension mismatch at vector {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// A vector has no direction and cannot be normalized.
    #[error("vector {index} has zero norm")]
    ZeroNorm { index: usize },

    /// A vector contains NaN or an infinity.
    #[error("vector {index} contains a non-finite value")]
    NonFinite { index: usize },

    /// Parallel inputs (labels, vectors, records) disagree in length.
    #[error("length mismatch: {labels} labels, {vectors} vectors, {records} records")]
    LengthMismatch {
        labels: usize,
        vectors: usize,
        records: usize,
    },

    /// A label was present with no members.
    #[error("cluster {label} has no members")]
    EmptyCluster { label: usize },

    /// A clustering result breaks one of its invariants.
    #[error("invalid clustering result: {0}")]
    InvalidResult(String),
}

/// Result type used by the clustering core.
pub type Result<T> = std::result::Result<T, ClusterError>;
