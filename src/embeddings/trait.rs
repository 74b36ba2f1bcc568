use anyhow::Result;
use std::path::Path;

/// Trait for embedding providers that turn an image into a feature vector
#[async_trait::async_trait]
pub trait ImageEmbeddingProvider: Send + Sync {
    /// Compute the embedding for one image.
    ///
    /// `filename` is the image's name relative to the input directory and
    /// `path` its location on disk. A failure only excludes this image.
    async fn embed_image(&self, filename: &str, path: &Path) -> Result<Vec<f32>>;

    /// Identifier of the model behind the vectors, recorded in the output
    fn model_id(&self) -> &str;
}
