use crate::constants::{DEFAULT_EMBED_CONCURRENCY, DEFAULT_IMAGE_DIR};
use crate::embeddings::http::{DEFAULT_MODEL, DEFAULT_URL};
use crate::pipeline::DEFAULT_MIN_CLUSTER_SIZE;
use crate::utils;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from settings.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Where embeddings come from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Http,
    Precomputed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// JSON file of precomputed embeddings
    #[serde(default)]
    pub vectors: Option<String>,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_EMBED_CONCURRENCY
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Http,
            url: default_url(),
            model: default_model(),
            concurrency: default_concurrency(),
            vectors: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
}

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: default_min_cluster_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Image directory as referenced from the HTML page
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

fn default_image_dir() -> String {
    DEFAULT_IMAGE_DIR.to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load configuration from default location or return defaults
    pub fn load() -> Result<Self> {
        let default_paths = [
            "config/settings.toml",
            "./config/settings.toml",
            "~/.config/imgcluster/settings.toml",
        ];

        for path in default_paths {
            let path = PathBuf::from(utils::expand_path(path));
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Load from an explicit path when given, otherwise from the default
    /// locations
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Precomputed embeddings path with `~` expanded
    pub fn vectors_path(&self) -> Option<PathBuf> {
        self.embedding
            .vectors
            .as_deref()
            .map(|p| PathBuf::from(utils::expand_path(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Http);
        assert_eq!(config.embedding.url, "http://127.0.0.1:8000");
        assert_eq!(config.embedding.model, "clip-vit-b32");
        assert_eq!(config.clustering.min_cluster_size, 2);
        assert_eq!(config.render.image_dir, "../sample-images");
        assert!(config.vectors_path().is_none());
    }

    #[test]
    fn test_config_from_file() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            r#"
[embedding]
provider = "precomputed"
model = "siglip-base"
vectors = "vectors.json"

[clustering]
min_cluster_size = 3
"#,
        )
        .unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Precomputed);
        assert_eq!(config.embedding.model, "siglip-base");
        assert_eq!(config.embedding.concurrency, 4);
        assert_eq!(config.clustering.min_cluster_size, 3);
        assert_eq!(config.vectors_path(), Some(PathBuf::from("vectors.json")));
        assert_eq!(config.render.image_dir, "../sample-images");
    }

    #[test]
    fn test_config_rejects_unknown_provider() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[embedding]\nprovider = \"carrier-pigeon\"\n").unwrap();
        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_resolve_missing_explicit_path() {
        assert!(Config::resolve(Some(Path::new("/nonexistent/settings.toml"))).is_err());
    }
}
