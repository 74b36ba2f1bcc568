/// Constants used throughout imgcluster

/// Image file extensions picked up when scanning an input directory
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Default directory scanned for images
pub const DEFAULT_INPUT_DIR: &str = "sample-images";

/// Default location of the clustering result
pub const DEFAULT_RESULT_PATH: &str = "output/clusters.json";

/// Default location of the rendered HTML page
pub const DEFAULT_HTML_PATH: &str = "output/clusters.html";

/// Default image directory as seen from the rendered page
pub const DEFAULT_IMAGE_DIR: &str = "../sample-images";

/// Default number of images embedded concurrently
pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;
