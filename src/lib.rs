pub mod acquire;
pub mod clustering;
pub mod config;
pub mod constants;
pub mod embeddings;
pub mod error;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod utils;

pub use clustering::{ClusterLabel, DensityClusterer, Hdbscan};
pub use embeddings::ImageEmbeddingProvider;
pub use error::ClusterError;
pub use models::{Cluster, ClusteringResult, ImageRecord};
pub use pipeline::{ClusteringPipeline, EmbeddedImage};
