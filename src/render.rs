use crate::models::{ClusteringResult, ImageRecord};
use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;
use std::path::Path;

const STYLE: &str = r#"
        * { box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #1a1a2e;
            color: #eee;
            line-height: 1.6;
        }
        h1 { color: #e94560; border-bottom: 2px solid #e94560; padding-bottom: 10px; margin-bottom: 20px; }
        .summary {
            background: #16213e;
            padding: 20px;
            border-radius: 8px;
            margin-bottom: 30px;
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
            gap: 20px;
        }
        .summary-item { text-align: center; }
        .summary-value { font-size: 2em; font-weight: bold; color: #e94560; }
        .summary-label { color: #888; font-size: 0.9em; }
        .cluster { background: #16213e; border-radius: 8px; padding: 20px; margin-bottom: 30px; }
        .cluster h2 {
            margin: 0 0 15px 0;
            color: #0f3460;
            background: #e94560;
            padding: 10px 15px;
            border-radius: 4px;
            display: inline-block;
        }
        .cluster-meta { color: #888; font-size: 0.9em; margin-bottom: 15px; }
        .images { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 15px; }
        .image-card { position: relative; border-radius: 8px; overflow: hidden; background: #0f3460; }
        .image-card img { width: 100%; height: 120px; object-fit: cover; display: block; }
        .image-card.representative { box-shadow: 0 0 0 3px #4ecca3; }
        .image-card.representative::before {
            content: '★ Representative';
            position: absolute;
            top: 5px;
            left: 5px;
            background: #4ecca3;
            color: #1a1a2e;
            padding: 2px 8px;
            border-radius: 4px;
            font-size: 0.7em;
            font-weight: bold;
            z-index: 1;
        }
        .image-info { padding: 8px; font-size: 0.8em; }
        .image-info .country { font-weight: bold; color: #e94560; }
        .image-info .category { color: #4ecca3; margin-left: 6px; }
        .image-info .filename { color: #888; word-break: break-all; }
        .unclustered { opacity: 0.7; }
        .unclustered h2 { background: #666; }
        .meta { color: #666; font-size: 0.8em; margin-top: 30px; padding-top: 20px; border-top: 1px solid #333; }
"#;

/// Read a clustering result and check its invariants
pub fn load_result(path: &Path) -> Result<ClusteringResult> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Result file not found: {} (run `imgcluster cluster` first)",
            path.display()
        )
    })?;
    let result: ClusteringResult = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse result file: {}", path.display()))?;
    result
        .validate()
        .with_context(|| format!("Result file is inconsistent: {}", path.display()))?;
    Ok(result)
}

/// Render a clustering result as a self-contained HTML page.
///
/// Images are referenced as `<image_dir>/<filename>`.
pub fn render_html(result: &ClusteringResult, image_dir: &str) -> String {
    let mut html = String::new();
    let image_dir = image_dir.trim_end_matches('/');

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Image Clustering Results</title>
    <style>{STYLE}    </style>
</head>
<body>
    <h1>Image Clustering Results</h1>

    <div class="summary">
"#
    );
    for (value, label) in [
        (result.summary.total_images, "Total Images"),
        (result.summary.num_clusters, "Clusters"),
        (result.summary.num_unclustered, "Unclustered"),
    ] {
        let _ = write!(
            html,
            r#"        <div class="summary-item">
            <div class="summary-value">{value}</div>
            <div class="summary-label">{label}</div>
        </div>
"#
        );
    }
    html.push_str("    </div>\n");

    for cluster in &result.clusters {
        let _ = write!(
            html,
            r#"
    <div class="cluster">
        <h2>{}</h2>
        <div class="cluster-meta">
            {} images | Countries: {}
        </div>
        <div class="images">
"#,
            encode_text(&cluster.id),
            cluster.size,
            encode_text(&cluster.countries().join(", "))
        );
        for member in &cluster.members {
            let is_representative = member.filename == cluster.representative.filename;
            push_card(&mut html, member, image_dir, is_representative);
        }
        html.push_str("        </div>\n    </div>\n");
    }

    if !result.unclustered.is_empty() {
        let _ = write!(
            html,
            r#"
    <div class="cluster unclustered">
        <h2>Unclustered</h2>
        <div class="cluster-meta">
            {} images that didn't fit any cluster
        </div>
        <div class="images">
"#,
            result.unclustered.len()
        );
        for member in &result.unclustered {
            push_card(&mut html, member, image_dir, false);
        }
        html.push_str("        </div>\n    </div>\n");
    }

    let _ = write!(
        html,
        r#"
    <div class="meta">
        <p>Generated: {}</p>
        <p>Model: {}</p>
        <p>Settings: min_cluster_size={}, metric={}</p>
    </div>
</body>
</html>
"#,
        result.generated_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        encode_text(&result.model),
        result.settings.min_cluster_size,
        encode_text(&result.settings.metric)
    );

    html
}

fn push_card(html: &mut String, member: &ImageRecord, image_dir: &str, representative: bool) {
    let class = if representative {
        "image-card representative"
    } else {
        "image-card"
    };
    let filename = encode_double_quoted_attribute(&member.filename);
    let _ = write!(
        html,
        r#"            <div class="{class}">
                <img src="{dir}/{filename}" alt="{filename}" loading="lazy">
                <div class="image-info">
                    <span class="country">{country}</span>
                    <span class="category">{category}</span>
                    <div class="filename">{identifier}</div>
                </div>
            </div>
"#,
        dir = encode_double_quoted_attribute(image_dir),
        country = encode_text(&member.country),
        category = member.category,
        identifier = encode_text(&member.identifier),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::image_record;
    use crate::models::{Cluster, Settings, Summary};
    use chrono::{TimeZone, Utc};

    fn result() -> ClusteringResult {
        let a = image_record("de-001-800w.webp");
        let b = image_record("fr-002-800w.webp");
        let c = image_record("mystery.webp");
        ClusteringResult {
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
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
                representative: b.clone(),
                members: vec![a, b],
            }],
            unclustered: vec![c],
        }
    }

    #[test]
    fn test_render_escapes_interpolated_text() {
        let mut result = result();
        result.model = "<clip & co>".to_string();
        result.unclustered[0] = image_record(r#"a"b<c>.webp"#);

        let html = render_html(&result, "img");

        assert!(html.contains("Model: &lt;clip &amp; co&gt;"));
        assert!(html.contains(r#"src="img/a&quot;b&lt;c&gt;.webp""#));
        assert!(!html.contains("<clip"));
    }

    #[test]
    fn test_render_contains_clusters_and_summary() {
        let html = render_html(&result(), "../sample-images/");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>cluster-0</h2>"));
        assert!(html.contains("2 images | Countries: DE, FR"));
        assert!(html.contains(r#"<span class="category">bollard</span>"#));
        assert!(html.contains(r#"<span class="category">unknown</span>"#));
        assert!(html.contains(r#"src="../sample-images/de-001-800w.webp""#));
        assert!(html.contains("1 images that didn't fit any cluster"));
        assert!(html.contains("Generated: 2024-05-01T08:00:00.000000Z"));
        assert!(html.contains("min_cluster_size=2, metric=cosine"));
    }

    #[test]
    fn test_render_marks_only_representative() {
        let html = render_html(&result(), "img");
        assert_eq!(html.matches(r#"class="image-card representative""#).count(), 1);
        let marker = html.find("image-card representative").unwrap();
        let fr = html.find(r#"src="img/fr-002-800w.webp""#).unwrap();
        assert!(marker < fr);
        assert!(html.find(r#"src="img/de-001-800w.webp""#).unwrap() < marker);
    }

    #[test]
    fn test_render_skips_empty_unclustered() {
        let mut result = result();
        result.unclustered.clear();
        result.summary.total_images = 2;
        result.summary.num_unclustered = 0;
        let html = render_html(&result, "img");
        assert!(!html.contains("<h2>Unclustered</h2>"));
    }

    #[test]
    fn test_load_result_roundtrip_and_validation() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string_pretty(&result()).unwrap()).unwrap();
        assert_eq!(load_result(file.path()).unwrap(), result());

        let mut broken = result();
        broken.summary.num_clusters = 5;
        std::fs::write(file.path(), serde_json::to_string(&broken).unwrap()).unwrap();
        assert!(load_result(file.path()).is_err());
    }

    #[test]
    fn test_load_result_missing_or_malformed() {
        assert!(load_result(Path::new("/nonexistent/clusters.json")).is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        assert!(load_result(file.path()).is_err());
    }
}
