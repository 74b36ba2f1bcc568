use super::density::ClusterLabel;
use super::util;
use crate::error::{ClusterError, Result};
use crate::models::{Cluster, ClusteringResult, ImageRecord, Settings, Summary};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Indices grouped by label.
///
/// Output order policy: clusters are keyed by ascending numeric label, members
/// and noise keep input order. This is a presentation convention, not a
/// similarity ranking.
#[derive(Debug, Default, PartialEq)]
pub struct LabelGroups {
    pub clusters: BTreeMap<usize, Vec<usize>>,
    pub noise: Vec<usize>,
}

pub fn group_by_label(labels: &[ClusterLabel]) -> LabelGroups {
    let mut groups = LabelGroups::default();
    for (index, label) in labels.iter().enumerate() {
        match label {
            ClusterLabel::Cluster(id) => groups.clusters.entry(*id).or_default().push(index),
            ClusterLabel::Noise => groups.noise.push(index),
        }
    }
    groups
}

/// Coordinate-wise mean of the member vectors
pub fn centroid(members: &[usize], vectors: &[Vec<f32>]) -> Vec<f32> {
    let Some(&first) = members.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; vectors[first].len()];
    for &index in members {
        for (acc, value) in sum.iter_mut().zip(&vectors[index]) {
            *acc += value;
        }
    }
    let count = members.len() as f32;
    sum.iter_mut().for_each(|v| *v /= count);
    sum
}

/// Representative policy: the member nearest the centroid, ties going to the
/// lowest input index. `None` only for an empty member list.
pub fn nearest_to_centroid(members: &[usize], vectors: &[Vec<f32>]) -> Option<usize> {
    let center = centroid(members, vectors);
    let mut best: Option<(usize, f32)> = None;
    // members are in ascending index order, so strict `<` keeps the lowest.
    for &index in members {
        let distance = util::euclidean(&vectors[index], &center);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Everything the assembler needs besides labels and vectors
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub model: String,
    pub settings: Settings,
    pub generated_at: DateTime<Utc>,
}

/// Build the serializable result from parallel labels, vectors and records.
pub fn assemble(
    labels: &[ClusterLabel],
    vectors: &[Vec<f32>],
    records: &[ImageRecord],
    info: RunInfo,
) -> Result<ClusteringResult> {
    if labels.len() != vectors.len() || labels.len() != records.len() {
        return Err(ClusterError::LengthMismatch {
            labels: labels.len(),
            vectors: vectors.len(),
            records: records.len(),
        });
    }

    let groups = group_by_label(labels);

    let mut clusters = Vec::with_capacity(groups.clusters.len());
    for (&label, members) in &groups.clusters {
        let representative =
            nearest_to_centroid(members, vectors).ok_or(ClusterError::EmptyCluster { label })?;
        clusters.push(Cluster {
            id: Cluster::id_for(label),
            size: members.len(),
            representative: records[representative].clone(),
            members: members.iter().map(|&i| records[i].clone()).collect(),
        });
    }

    let unclustered: Vec<ImageRecord> = groups.noise.iter().map(|&i| records[i].clone()).collect();

    Ok(ClusteringResult {
        generated_at: info.generated_at,
        model: info.model,
        settings: info.settings,
        summary: Summary {
            total_images: records.len(),
            num_clusters: clusters.len(),
            num_unclustered: unclustered.len(),
        },
        clusters,
        unclustered,
    })
}
