use crate::error::{ClusterError, Result};

/// Check that a batch is non-empty, of one non-zero dimension, and finite.
///
/// Returns the shared dimension.
pub fn validate_vectors(vectors: &[Vec<f32>]) -> Result<usize> {
    let first = vectors.first().ok_or(ClusterError::EmptyInput)?;
    let dimension = first.len();
    if dimension == 0 {
        return Err(ClusterError::InvalidParameter {
            name: "dimension",
            message: "must be at least 1",
        });
    }

    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != dimension {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected: dimension,
                found: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(ClusterError::NonFinite { index });
        }
    }

    Ok(dimension)
}

#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Rescale every vector to unit Euclidean norm.
///
/// On unit vectors `|a - b|^2 = 2 - 2 cos(a, b)`, so Euclidean clustering
/// downstream ranks pairs exactly as cosine similarity would.
pub fn normalize(vectors: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
    validate_vectors(vectors)?;

    vectors
        .iter()
        .enumerate()
        .map(|(index, vector)| {
            let norm = l2_norm(vector);
            if norm == 0.0 || !norm.is_finite() {
                return Err(ClusterError::ZeroNorm { index });
            }
            Ok(vector.iter().map(|x| x / norm).collect())
        })
        .collect()
}
