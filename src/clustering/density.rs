use crate::error::Result;

/// Label assigned to one vector by a density clusterer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterLabel {
    /// Not part of any sufficiently dense group
    Noise,
    Cluster(usize),
}

impl ClusterLabel {
    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }

    pub fn cluster_id(&self) -> Option<usize> {
        match self {
            ClusterLabel::Cluster(id) => Some(*id),
            ClusterLabel::Noise => None,
        }
    }
}

/// Common interface for clusterers that infer the number of clusters from
/// density and may leave points unclustered.
///
/// Implementations must be deterministic for identical input order and
/// parameters, must never emit a cluster smaller than `min_cluster_size`,
/// and compare vectors with plain Euclidean distance.
pub trait DensityClusterer {
    /// Return one label per input vector.
    fn cluster(&self, vectors: &[Vec<f32>], min_cluster_size: usize) -> Result<Vec<ClusterLabel>>;
}
