use crate::embeddings::ImageEmbeddingProvider;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image embedding provider backed by an HTTP inference server.
///
/// Sends `{ "model", "image" }` (image bytes base64-encoded) to `<url>/embed`
/// and expects `{ "embedding": [...] }` back.
pub struct HttpEmbeddingProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    pub fn new(base_url: Option<&str>, model: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embed", self.base_url)
    }
}

pub const DEFAULT_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MODEL: &str = "clip-vit-b32";

#[derive(Serialize)]
struct EmbedImageRequest<'a> {
    model: &'a str,
    image: String,
}

#[derive(Deserialize)]
struct EmbedImageResponse {
    embedding: Vec<f32>,
}

#[async_trait::async_trait]
impl ImageEmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_image(&self, filename: &str, path: &Path) -> Result<Vec<f32>> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        if bytes.is_empty() {
            anyhow::bail!("Image file is empty: {}", filename);
        }

        let request = EmbedImageRequest {
            model: &self.model,
            image: general_purpose::STANDARD.encode(&bytes),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .context("Failed to connect to embedding server")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding server returned error {}: {}", status, error_text);
        }

        let embedding_response: EmbedImageResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        if embedding_response.embedding.is_empty() {
            anyhow::bail!("Embedding server returned an empty embedding for {}", filename);
        }

        Ok(embedding_response.embedding)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_http_provider_defaults() {
        let provider = HttpEmbeddingProvider::new(None, None);
        assert_eq!(provider.base_url, "http://127.0.0.1:8000");
        assert_eq!(provider.model_id(), "clip-vit-b32");
    }

    #[test]
    fn test_http_provider_trims_trailing_slash() {
        let provider = HttpEmbeddingProvider::new(Some("http://localhost:9000/"), Some("siglip"));
        assert_eq!(provider.endpoint(), "http://localhost:9000/embed");
        assert_eq!(provider.model_id(), "siglip");
    }

    #[tokio::test]
    async fn test_missing_image_fails() {
        let provider = HttpEmbeddingProvider::new(None, None);
        let result = provider
            .embed_image("missing.webp", Path::new("/nonexistent/missing.webp"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_image_fails_before_request() {
        let file = NamedTempFile::new().unwrap();
        let provider = HttpEmbeddingProvider::new(Some("http://127.0.0.1:1"), None);
        let err = provider.embed_image("empty.webp", file.path()).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    #[ignore] // Requires an embedding server running
    async fn test_http_provider_compute() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"RIFF....WEBPVP8 ").unwrap();
        let provider = HttpEmbeddingProvider::new(None, None);
        let embedding = provider.embed_image("sample.webp", file.path()).await.unwrap();
        assert!(!embedding.iter().all(|&x| x == 0.0));
    }
}
