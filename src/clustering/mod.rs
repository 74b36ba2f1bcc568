//! Density-based clustering of image embeddings.
//!
//! The core runs in three steps, each a pure function over in-memory data:
//!
//! - [`normalize`]: validate the batch and scale vectors to unit length, so
//!   Euclidean distance behaves like cosine distance;
//! - [`DensityClusterer`]: label every vector with a cluster id or noise
//!   ([`Hdbscan`] is the provided implementation);
//! - [`assemble`]: group by label, pick representatives, build the result.

pub mod assembler;
pub mod density;
pub mod hdbscan;
pub mod normalize;
mod util;

pub use assembler::{assemble, nearest_to_centroid, RunInfo};
pub use density::{ClusterLabel, DensityClusterer};
pub use hdbscan::Hdbscan;
pub use normalize::{normalize, validate_vectors};
