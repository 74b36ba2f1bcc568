use crate::clustering::{assemble, normalize, DensityClusterer, Hdbscan, RunInfo};
use crate::error::Result;
use crate::models::{ClusteringResult, ImageRecord, Settings};
use chrono::Utc;
use tracing::debug;

/// Default minimum number of images per cluster
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

/// An image that made it through embedding, paired with its vector
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub record: ImageRecord,
    pub embedding: Vec<f32>,
}

/// Normalize → cluster → assemble over one fixed batch.
///
/// Holds no state between runs; concurrent runs on separate batches are
/// independent.
pub struct ClusteringPipeline<C: DensityClusterer = Hdbscan> {
    clusterer: C,
    min_cluster_size: usize,
}

impl ClusteringPipeline<Hdbscan> {
    pub fn new(min_cluster_size: usize) -> Self {
        Self::with_clusterer(Hdbscan::new(), min_cluster_size)
    }
}

impl<C: DensityClusterer> ClusteringPipeline<C> {
    pub fn with_clusterer(clusterer: C, min_cluster_size: usize) -> Self {
        Self {
            clusterer,
            min_cluster_size,
        }
    }

    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Cluster a batch of embedded images.
    ///
    /// Fails on an empty batch, a dimension mismatch, a zero-norm or
    /// non-finite vector, or an invalid `min_cluster_size`. A batch where
    /// everything is noise is a valid result.
    pub fn run(&self, images: &[EmbeddedImage], model: &str) -> Result<ClusteringResult> {
        let vectors: Vec<Vec<f32>> = images.iter().map(|img| img.embedding.clone()).collect();
        let records: Vec<ImageRecord> = images.iter().map(|img| img.record.clone()).collect();

        let normalized = normalize(&vectors)?;
        debug!(
            images = normalized.len(),
            dimension = normalized[0].len(),
            "normalized embeddings"
        );

        let labels = self.clusterer.cluster(&normalized, self.min_cluster_size)?;
        debug!(noise = labels.iter().filter(|l| l.is_noise()).count(), "labelled embeddings");

        let info = RunInfo {
            model: model.to_string(),
            settings: Settings::new(self.min_cluster_size),
            generated_at: Utc::now(),
        };
        let result = assemble(&labels, &normalized, &records, info)?;
        result.validate()?;

        Ok(result)
    }
}
