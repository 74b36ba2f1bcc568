use crate::constants::IMAGE_EXTENSIONS;
use std::path::Path;

/// Get file extension from path (without the dot)
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// Whether the path has one of the known image extensions
pub fn is_image_file(path: &Path) -> bool {
    get_extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// `path` relative to `base`, `/`-separated regardless of platform.
///
/// Falls back to the file name when `path` is not under `base`.
pub fn relative_name(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Expand a leading `~` and environment variables in a path
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .map(|expanded| expanded.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extension_lowercase() {
        let path = Path::new("/path/to/file.WEBP");
        assert_eq!(get_extension(path), Some("webp".to_string()));
    }

    #[test]
    fn test_get_extension_no_extension() {
        assert_eq!(get_extension(Path::new("/path/to/file")), None);
    }

    #[test]
    fn test_get_extension_multiple_dots() {
        let path = Path::new("/path/to/file.tar.gz");
        assert_eq!(get_extension(path), Some("gz".to_string()));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("de-001-800w.webp")));
        assert!(is_image_file(Path::new("photo.JPG")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn test_relative_name_nested() {
        let base = Path::new("/data/images");
        let path = Path::new("/data/images/us/66e09dbb-800w.webp");
        assert_eq!(relative_name(base, path), "us/66e09dbb-800w.webp");
    }

    #[test]
    fn test_relative_name_outside_base() {
        let base = Path::new("/data/images");
        let path = Path::new("/elsewhere/de-001-800w.webp");
        assert_eq!(relative_name(base, path), "de-001-800w.webp");
    }

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("output/clusters.json"), "output/clusters.json");
    }
}
