use crate::error::{ClusterError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reported similarity metric. Clustering runs Euclidean distance over
/// unit-normalized vectors, which orders pairs the same way cosine does.
pub const METRIC: &str = "cosine";

/// Kind of image, inferred from its filename
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Bollard,
    FollowCar,
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Bollard => "bollard",
            Category::FollowCar => "follow-car",
            Category::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One successfully embedded image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    /// Path relative to the input directory, `/`-separated
    pub filename: String,
    /// Upper-case ISO country code, or "XX" when unknown
    pub country: String,
    pub identifier: String,
    #[serde(alias = "type")]
    pub category: Category,
}

/// Parameters that shaped a clustering run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub min_cluster_size: usize,
    pub metric: String,
}

impl Settings {
    pub fn new(min_cluster_size: usize) -> Self {
        Self {
            min_cluster_size,
            metric: METRIC.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub total_images: usize,
    pub num_clusters: usize,
    pub num_unclustered: usize,
}

/// A group of visually similar images
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub size: usize,
    /// Member closest to the cluster centroid
    pub representative: ImageRecord,
    /// Members in input order
    pub members: Vec<ImageRecord>,
}

impl Cluster {
    /// Stable id for a cluster label
    pub fn id_for(label: usize) -> String {
        format!("cluster-{}", label)
    }

    /// Numeric label encoded in the id, if well formed
    pub fn label(&self) -> Option<usize> {
        self.id.strip_prefix("cluster-")?.parse().ok()
    }

    /// Sorted, de-duplicated member countries
    pub fn countries(&self) -> Vec<&str> {
        let mut countries: Vec<&str> = self.members.iter().map(|m| m.country.as_str()).collect();
        countries.sort_unstable();
        countries.dedup();
        countries
    }
}

/// Serialized output of one clustering run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusteringResult {
    #[serde(rename = "generatedAt", with = "timestamp")]
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub settings: Settings,
    pub summary: Summary,
    pub clusters: Vec<Cluster>,
    pub unclustered: Vec<ImageRecord>,
}

impl ClusteringResult {
    /// Check the membership and ordering invariants of a result.
    ///
    /// Used on freshly assembled results and on files read back from disk
    /// before rendering.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(ClusterError::InvalidResult(message));

        let clustered: usize = self.clusters.iter().map(|c| c.size).sum();
        if self.summary.total_images != clustered + self.unclustered.len() {
            return invalid(format!(
                "total_images is {} but clusters hold {} and {} are unclustered",
                self.summary.total_images,
                clustered,
                self.unclustered.len()
            ));
        }
        if self.summary.num_clusters != self.clusters.len() {
            return invalid(format!(
                "num_clusters is {} but {} clusters are present",
                self.summary.num_clusters,
                self.clusters.len()
            ));
        }
        if self.summary.num_unclustered != self.unclustered.len() {
            return invalid(format!(
                "num_unclustered is {} but {} images are unclustered",
                self.summary.num_unclustered,
                self.unclustered.len()
            ));
        }

        let mut previous_label: Option<usize> = None;
        for cluster in &self.clusters {
            let Some(label) = cluster.label() else {
                return invalid(format!("malformed cluster id '{}'", cluster.id));
            };
            if previous_label.is_some_and(|prev| label <= prev) {
                return invalid(format!("{} is out of ascending order", cluster.id));
            }
            previous_label = Some(label);

            if cluster.size != cluster.members.len() {
                return invalid(format!(
                    "{} reports size {} but has {} members",
                    cluster.id,
                    cluster.size,
                    cluster.members.len()
                ));
            }
            if cluster.size < self.settings.min_cluster_size {
                return invalid(format!(
                    "{} has {} members, below min_cluster_size {}",
                    cluster.id, cluster.size, self.settings.min_cluster_size
                ));
            }
            if !cluster.members.contains(&cluster.representative) {
                return invalid(format!(
                    "representative {} of {} is not a member",
                    cluster.representative.filename, cluster.id
                ));
            }
        }

        let mut seen = HashSet::new();
        let all_records = self
            .clusters
            .iter()
            .flat_map(|c| c.members.iter())
            .chain(self.unclustered.iter());
        for record in all_records {
            if !seen.insert(record.filename.as_str()) {
                return invalid(format!("{} appears more than once", record.filename));
            }
        }

        Ok(())
    }
}

/// UTC timestamps as ISO-8601 with a literal `Z` suffix
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(filename: &str, country: &str) -> ImageRecord {
        ImageRecord {
            filename: filename.to_string(),
            country: country.to_string(),
            identifier: filename.to_string(),
            category: Category::Unknown,
        }
    }

    fn sample_result() -> ClusteringResult {
        let a = record("a.webp", "DE");
        let b = record("b.webp", "FR");
        let c = record("c.webp", "DE");
        ClusteringResult {
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            model: "clip-vit-b32".to_string(),
            settings: Settings::new(2),
            summary: Summary {
                total_images: 3,
                num_clusters: 1,
                num_unclustered: 1,
            },
            clusters: vec![Cluster {
                id: Cluster::id_for(0),
                size: 2,
                representative: a.clone(),
                members: vec![a, b],
            }],
            unclustered: vec![c],
        }
    }

    #[test]
    fn test_category_display_matches_wire_name() {
        for category in [Category::Bollard, Category::FollowCar, Category::Unknown] {
            let wire = serde_json::to_string(&category).unwrap();
            assert_eq!(wire, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_valid_result_passes() {
        assert!(sample_result().validate().is_ok());
    }

    #[test]
    fn test_timestamp_uses_z_suffix() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["generatedAt"], "2024-05-01T12:30:00.000000Z");
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["settings"]["metric"], "cosine");
        assert_eq!(json["summary"]["num_unclustered"], 1);
        assert_eq!(json["clusters"][0]["id"], "cluster-0");
        assert_eq!(json["clusters"][0]["members"][1]["category"], "unknown");
    }

    #[test]
    fn test_result_serialization() {
        let result = sample_result();
        let serialized = serde_json::to_string_pretty(&result).unwrap();
        let deserialized: ClusteringResult = serde_json::from_str(&serialized).unwrap();
        assert_eq!(result, deserialized);
    }

    #[test]
    fn test_legacy_type_key_accepted() {
        let json = r#"{"filename":"de-001-800w.webp","country":"DE","identifier":"001","type":"bollard"}"#;
        let record: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, Category::Bollard);
    }

    #[test]
    fn test_rejects_summary_mismatch() {
        let mut result = sample_result();
        result.summary.total_images = 4;
        assert!(matches!(result.validate(), Err(ClusterError::InvalidResult(_))));
    }

    #[test]
    fn test_rejects_foreign_representative() {
        let mut result = sample_result();
        result.clusters[0].representative = record("c.webp", "DE");
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_member() {
        let mut result = sample_result();
        result.unclustered = vec![record("a.webp", "DE")];
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_rejects_descending_cluster_order() {
        let mut result = sample_result();
        let mut second = result.clusters[0].clone();
        second.id = Cluster::id_for(0);
        second.members = vec![record("c.webp", "DE"), record("d.webp", "DE")];
        second.representative = second.members[0].clone();
        result.clusters[0].id = Cluster::id_for(3);
        result.clusters.push(second);
        result.unclustered.clear();
        result.summary = Summary {
            total_images: 4,
            num_clusters: 2,
            num_unclustered: 0,
        };
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_countries_sorted_and_deduplicated() {
        let cluster = Cluster {
            id: Cluster::id_for(1),
            size: 3,
            representative: record("x", "FR"),
            members: vec![record("x", "FR"), record("y", "DE"), record("z", "FR")],
        };
        assert_eq!(cluster.countries(), vec!["DE", "FR"]);
        assert_eq!(cluster.label(), Some(1));
    }
}
