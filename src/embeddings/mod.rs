pub mod r#trait;
pub mod http;
pub mod precomputed;

pub use http::HttpEmbeddingProvider;
pub use precomputed::PrecomputedEmbeddings;
pub use r#trait::ImageEmbeddingProvider;

use crate::config::{Config, EmbeddingProviderKind};
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Pick the embedding provider for a run.
///
/// An explicit `vectors` file always wins and selects precomputed embeddings.
/// Otherwise `[embedding] provider` decides; `precomputed` without a
/// `vectors` path is an error.
pub fn from_config(
    config: &Config,
    vectors: Option<PathBuf>,
) -> Result<Box<dyn ImageEmbeddingProvider>> {
    let vectors = vectors.or_else(|| match config.embedding.provider {
        EmbeddingProviderKind::Precomputed => config.vectors_path(),
        EmbeddingProviderKind::Http => None,
    });

    match (config.embedding.provider, vectors) {
        (_, Some(path)) => {
            let precomputed = PrecomputedEmbeddings::from_file(&path)?;
            info!(
                path = %path.display(),
                vectors = precomputed.len(),
                "Using precomputed embeddings"
            );
            Ok(Box::new(precomputed))
        }
        (EmbeddingProviderKind::Precomputed, None) => {
            anyhow::bail!("Precomputed embeddings selected but no vectors file configured")
        }
        (EmbeddingProviderKind::Http, None) => Ok(Box::new(HttpEmbeddingProvider::new(
            Some(config.embedding.url.as_str()),
            Some(config.embedding.model.as_str()),
        ))),
    }
}
