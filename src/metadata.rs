use crate::models::{Category, ImageRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Country code used when a filename carries none
pub const UNKNOWN_COUNTRY: &str = "XX";

// bollards:    de-001-800w.webp
// follow-cars: us/66e09dbb-800w.webp or us-66e09dbb-800w.webp
static BOLLARD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]{2})-(\d+)-\d+w\.webp$").expect("valid bollard pattern"));
static FOLLOW_CAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]{2})[-/]([a-f0-9]{8})-\d+w\.webp$").expect("valid follow-car pattern")
});

/// Display metadata parsed from an image filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    pub country: String,
    pub identifier: String,
    pub category: Category,
}

impl ImageMeta {
    pub fn into_record(self, filename: impl Into<String>) -> ImageRecord {
        ImageRecord {
            filename: filename.into(),
            country: self.country,
            identifier: self.identifier,
            category: self.category,
        }
    }
}

/// Parse country, identifier and category out of a filename.
///
/// Matching is case-insensitive and runs on exactly the string supplied, so a
/// follow-car name only resolves when its country directory is included.
/// Anything unrecognised falls back to `XX`, the file stem, and `unknown`.
pub fn parse_image_id(filename: &str) -> ImageMeta {
    let name = filename.to_lowercase();

    let patterns = [
        (&*BOLLARD_PATTERN, Category::Bollard),
        (&*FOLLOW_CAR_PATTERN, Category::FollowCar),
    ];
    for (pattern, category) in patterns {
        if let Some(caps) = pattern.captures(&name) {
            return ImageMeta {
                country: caps[1].to_uppercase(),
                identifier: caps[2].to_string(),
                category,
            };
        }
    }

    let identifier = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string();

    ImageMeta {
        country: UNKNOWN_COUNTRY.to_string(),
        identifier,
        category: Category::Unknown,
    }
}

/// Build the full record for an image filename
pub fn image_record(filename: &str) -> ImageRecord {
    parse_image_id(filename).into_record(filename)
}
