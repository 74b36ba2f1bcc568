use crate::embeddings::ImageEmbeddingProvider;
use crate::metadata;
use crate::pipeline::EmbeddedImage;
use crate::utils;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// An image found on disk, not yet embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImage {
    /// Name relative to the input directory, `/`-separated
    pub filename: String,
    pub path: PathBuf,
}

/// Find images under `dir` in a stable, name-sorted order.
pub fn discover_images(dir: &Path) -> Result<Vec<DiscoveredImage>> {
    if !dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", dir.display());
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && utils::is_image_file(path) {
                    images.push(DiscoveredImage {
                        filename: utils::relative_name(dir, path),
                        path: path.to_path_buf(),
                    });
                }
            }
            Err(e) => {
                warn!("Error accessing entry: {}", e);
            }
        }
    }

    Ok(images)
}

/// Outcome of embedding a batch of images
#[derive(Debug, Default)]
pub struct Acquisition {
    /// Successfully embedded images, in discovery order
    pub embedded: Vec<EmbeddedImage>,
    /// `(filename, error)` for every image that was skipped
    pub failures: Vec<(String, String)>,
}

/// Embed every image, keeping discovery order.
///
/// An image whose embedding fails is logged and left out; it never aborts the
/// batch.
pub async fn embed_images(
    provider: &dyn ImageEmbeddingProvider,
    images: Vec<DiscoveredImage>,
    concurrency: usize,
) -> Acquisition {
    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} images embedded ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut results = stream::iter(images)
        .map(|image| async move {
            let outcome = provider.embed_image(&image.filename, &image.path).await;
            (image, outcome)
        })
        .buffered(concurrency.max(1));

    let mut acquisition = Acquisition::default();
    while let Some((image, outcome)) = results.next().await {
        match outcome {
            Ok(embedding) => {
                pb.set_message(image.filename.clone());
                acquisition.embedded.push(EmbeddedImage {
                    record: metadata::image_record(&image.filename),
                    embedding,
                });
            }
            Err(e) => {
                pb.suspend(|| warn!(file = %image.filename, "Failed to embed image, skipping: {:#}", e));
                acquisition.failures.push((image.filename, format!("{:#}", e)));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        embedded = acquisition.embedded.len(),
        failed = acquisition.failures.len(),
        "Embedding complete"
    );
    acquisition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::PrecomputedEmbeddings;
    use crate::models::Category;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"image").unwrap();
    }

    #[test]
    fn test_discover_images_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "fr-002-800w.webp");
        touch(dir.path(), "de-001-800w.webp");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "us/66e09dbb-800w.webp");

        let images = discover_images(dir.path()).unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["de-001-800w.webp", "fr-002-800w.webp", "us/66e09dbb-800w.webp"]
        );
    }

    #[test]
    fn test_discover_images_missing_dir() {
        assert!(discover_images(Path::new("/nonexistent/imgcluster-input")).is_err());
    }

    #[tokio::test]
    async fn test_embed_images_skips_failures() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "de-001-800w.webp");
        touch(dir.path(), "de-002-800w.webp");
        touch(dir.path(), "us/66e09dbb-800w.webp");

        let mut map = HashMap::new();
        map.insert("de-001-800w.webp".to_string(), vec![1.0, 0.0]);
        map.insert("us/66e09dbb-800w.webp".to_string(), vec![0.0, 1.0]);
        let provider = PrecomputedEmbeddings::new("test", map);

        let images = discover_images(dir.path()).unwrap();
        let acquisition = embed_images(&provider, images, 2).await;

        assert_eq!(acquisition.embedded.len(), 2);
        assert_eq!(acquisition.failures.len(), 1);
        assert_eq!(acquisition.failures[0].0, "de-002-800w.webp");

        let first = &acquisition.embedded[0].record;
        assert_eq!(first.filename, "de-001-800w.webp");
        assert_eq!(first.category, Category::Bollard);

        let second = &acquisition.embedded[1].record;
        assert_eq!(second.country, "US");
        assert_eq!(second.category, Category::FollowCar);
    }
}
