use crate::embeddings::ImageEmbeddingProvider;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Embeddings computed ahead of time and stored as JSON:
///
/// ```json
/// { "model": "clip-vit-b32", "embeddings": { "de-001-800w.webp": [0.1, 0.2] } }
/// ```
///
/// Keys are image names relative to the input directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecomputedEmbeddings {
    model: String,
    embeddings: HashMap<String, Vec<f32>>,
}

impl PrecomputedEmbeddings {
    pub fn new(model: impl Into<String>, embeddings: HashMap<String, Vec<f32>>) -> Self {
        Self {
            model: model.into(),
            embeddings,
        }
    }

    /// Load embeddings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read embeddings file: {}", path.as_ref().display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse embeddings file: {}", path.as_ref().display()))
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

#[async_trait::async_trait]
impl ImageEmbeddingProvider for PrecomputedEmbeddings {
    async fn embed_image(&self, filename: &str, _path: &Path) -> Result<Vec<f32>> {
        self.embeddings
            .get(filename)
            .cloned()
            .with_context(|| format!("No precomputed embedding for {}", filename))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            r#"{"model": "clip-vit-b32", "embeddings": {"de-001-800w.webp": [0.5, 0.5]}}"#,
        )
        .unwrap();

        let embeddings = PrecomputedEmbeddings::from_file(temp_file.path()).unwrap();
        assert_eq!(embeddings.model_id(), "clip-vit-b32");
        assert_eq!(embeddings.len(), 1);
    }

    #[test]
    fn test_from_file_malformed() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not json").unwrap();
        assert!(PrecomputedEmbeddings::from_file(temp_file.path()).is_err());
    }

    #[tokio::test]
    async fn test_lookup() {
        let mut map = HashMap::new();
        map.insert("us/66e09dbb-800w.webp".to_string(), vec![1.0, 2.0]);
        let embeddings = PrecomputedEmbeddings::new("test", map);

        let found = embeddings
            .embed_image("us/66e09dbb-800w.webp", Path::new("unused"))
            .await
            .unwrap();
        assert_eq!(found, vec![1.0, 2.0]);

        let missing = embeddings.embed_image("mystery.webp", Path::new("unused")).await;
        assert!(missing.is_err());
    }
}
