//! HDBSCAN: Hierarchical Density-Based Spatial Clustering of Applications with Noise.
//!
//! HDBSCAN (Campello, Moulavi, Sander 2013) removes DBSCAN's global epsilon by
//! building a hierarchy of density-based clusters and keeping the most stable
//! ones.
//!
//! 1. **Core distance**: distance from each point to its `min_samples`-th
//!    nearest other point.
//! 2. **Mutual reachability**: `mrd(i, j) = max(core[i], core[j], d(i, j))`.
//! 3. **MST** over mutual reachability with Prim's algorithm (O(n^2)).
//! 4. **Single linkage**: MST edges in ascending order build a dendrogram.
//! 5. **Condensed tree**: walking the dendrogram from the top, a split only
//!    creates new clusters when both sides hold at least `min_cluster_size`
//!    points; otherwise the smaller side's points fall out of the parent.
//! 6. **Excess of mass**: each cluster's stability is
//!    `sum(lambda_p - lambda_birth)` over what leaves it (`lambda = 1 / distance`).
//!    A cluster is kept when it is at least as stable as its best set of
//!    descendants. The root is never kept.
//! 7. **Labels**: a point takes the label of the nearest kept cluster above
//!    the place where it fell out, or is noise.
//!
//! Everything is deterministic: ties resolve by index and no randomness is used.

use super::density::{ClusterLabel, DensityClusterer};
use super::normalize::{l2_norm, validate_vectors};
use super::util::{self, LinkageUnionFind};
use crate::error::{ClusterError, Result};

/// HDBSCAN clusterer over plain Euclidean distance.
#[derive(Debug, Clone, Default)]
pub struct Hdbscan {
    min_samples: Option<usize>,
}

impl Hdbscan {
    /// `min_samples` follows `min_cluster_size` unless set explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `min_samples` (neighbourhood size for the core distance).
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = Some(min_samples);
        self
    }
}

impl DensityClusterer for Hdbscan {
    fn cluster(&self, vectors: &[Vec<f32>], min_cluster_size: usize) -> Result<Vec<ClusterLabel>> {
        if min_cluster_size < 2 {
            return Err(ClusterError::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 2",
            });
        }
        if self.min_samples == Some(0) {
            return Err(ClusterError::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        validate_vectors(vectors)?;

        let n = vectors.len();
        if n < min_cluster_size {
            return Ok(vec![ClusterLabel::Noise; n]);
        }
        // Zero spread: every split happens at infinite density and no
        // sub-cluster could ever be preferred over the whole set.
        if all_coincide(vectors) {
            return Ok(vec![ClusterLabel::Cluster(0); n]);
        }

        let min_samples = self.min_samples.unwrap_or(min_cluster_size);
        let dists = pairwise_distances(vectors);
        let core_dists = core_distances(&dists, n, min_samples);

        let mut mst = util::prim_mst(n, |i, j| {
            mutual_reachability(dists[i * n + j], core_dists[i], core_dists[j])
        });
        mst.sort_by(|a, b| a.2.total_cmp(&b.2));

        let hierarchy = single_linkage(&mst, n);
        let tree = condense_tree(&hierarchy, n, min_cluster_size);
        let selected = select_clusters(&tree);
        Ok(assign_labels(&tree, &selected))
    }
}

fn pairwise_distances(data: &[Vec<f32>]) -> Vec<f32> {
    let n = data.len();
    let mut dists = vec![0.0f32; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = util::euclidean(&data[i], &data[j]);
            dists[i * n + j] = d;
            dists[j * n + i] = d;
        }
    }
    dists
}

/// Relative distance under which two vectors count as the same point.
const COINCIDENT_TOLERANCE: f32 = 8.0 * f32::EPSILON;

/// True when every vector matches the first up to float rounding, so copies
/// that differ only by scaling before normalisation still coincide.
fn all_coincide(vectors: &[Vec<f32>]) -> bool {
    let first = &vectors[0];
    let scale = l2_norm(first).max(1.0);
    vectors[1..]
        .iter()
        .all(|v| util::euclidean(first, v) <= COINCIDENT_TOLERANCE * scale)
}

fn core_distances(dists: &[f32], n: usize, min_samples: usize) -> Vec<f32> {
    // The point itself does not count as a neighbour.
    let k = min_samples.min(n - 1).max(1);
    (0..n)
        .map(|i| {
            let mut row: Vec<f32> = (0..n)
                .filter(|&j| j != i)
                .map(|j| dists[i * n + j])
                .collect();
            row.sort_by(|a, b| a.total_cmp(b));
            row[k - 1]
        })
        .collect()
}

#[inline]
fn mutual_reachability(dist: f32, core_i: f32, core_j: f32) -> f32 {
    dist.max(core_i).max(core_j)
}

#[inline]
fn lambda_from_distance(distance: f32) -> f64 {
    if distance > 0.0 {
        1.0 / distance as f64
    } else {
        f64::INFINITY
    }
}

/// `lambda - birth`, with two infinities cancelling to zero.
#[inline]
fn persistence(lambda: f64, birth: f64) -> f64 {
    if lambda == birth {
        0.0
    } else {
        lambda - birth
    }
}

/// A merge in the single-linkage dendrogram. Merge `k` is node `n + k`.
#[derive(Debug, Clone)]
struct LinkageNode {
    left: usize,
    right: usize,
    distance: f32,
    size: usize,
}

fn single_linkage(sorted_mst: &[(usize, usize, f32)], n: usize) -> Vec<LinkageNode> {
    let mut uf = LinkageUnionFind::new(n);
    sorted_mst
        .iter()
        .map(|&(u, v, distance)| {
            let left = uf.find(u);
            let right = uf.find(v);
            let size = uf.size_of(left) + uf.size_of(right);
            uf.union(left, right);
            LinkageNode {
                left,
                right,
                distance,
                size,
            }
        })
        .collect()
}

/// Nodes of the dendrogram below `root`, breadth first, `root` included.
fn bfs_from_hierarchy(hierarchy: &[LinkageNode], n: usize, root: usize) -> Vec<usize> {
    let mut order = Vec::new();
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        order.extend_from_slice(&frontier);
        frontier = frontier
            .iter()
            .filter(|&&node| node >= n)
            .flat_map(|&node| {
                let merge = &hierarchy[node - n];
                [merge.left, merge.right]
            })
            .collect();
    }
    order
}

/// One row of the condensed tree.
///
/// `child` is a point index (`< n`, `child_size == 1`) falling out of `parent`,
/// or a cluster id (`>= n`) split off from it.
#[derive(Debug, Clone)]
struct CondensedEdge {
    parent: usize,
    child: usize,
    lambda: f64,
    child_size: usize,
}

#[derive(Debug)]
struct CondensedTree {
    edges: Vec<CondensedEdge>,
    n_points: usize,
    /// Clusters are ids `n_points..n_points + n_clusters`; the root is `n_points`.
    n_clusters: usize,
}

fn condense_tree(hierarchy: &[LinkageNode], n: usize, min_cluster_size: usize) -> CondensedTree {
    let root = 2 * n - 2;
    let mut relabel = vec![0usize; root + 1];
    let mut ignore = vec![false; root + 1];
    let mut edges = Vec::new();

    relabel[root] = n;
    let mut next_label = n + 1;

    let node_size = |node: usize| if node < n { 1 } else { hierarchy[node - n].size };

    for node in bfs_from_hierarchy(hierarchy, n, root) {
        if node < n || ignore[node] {
            continue;
        }

        let merge = &hierarchy[node - n];
        let lambda = lambda_from_distance(merge.distance);
        let parent = relabel[node];
        let (left, right) = (merge.left, merge.right);
        let (left_size, right_size) = (node_size(left), node_size(right));

        match (left_size >= min_cluster_size, right_size >= min_cluster_size) {
            (true, true) => {
                for (child, child_size) in [(left, left_size), (right, right_size)] {
                    relabel[child] = next_label;
                    edges.push(CondensedEdge {
                        parent,
                        child: next_label,
                        lambda,
                        child_size,
                    });
                    next_label += 1;
                }
            }
            (true, false) => {
                relabel[left] = parent;
                fall_out(hierarchy, n, right, parent, lambda, &mut edges, &mut ignore);
            }
            (false, true) => {
                relabel[right] = parent;
                fall_out(hierarchy, n, left, parent, lambda, &mut edges, &mut ignore);
            }
            (false, false) => {
                fall_out(hierarchy, n, left, parent, lambda, &mut edges, &mut ignore);
                fall_out(hierarchy, n, right, parent, lambda, &mut edges, &mut ignore);
            }
        }
    }

    CondensedTree {
        edges,
        n_points: n,
        n_clusters: next_label - n,
    }
}

/// Record every point under `subtree` as leaving `parent` at `lambda`.
fn fall_out(
    hierarchy: &[LinkageNode],
    n: usize,
    subtree: usize,
    parent: usize,
    lambda: f64,
    edges: &mut Vec<CondensedEdge>,
    ignore: &mut [bool],
) {
    for node in bfs_from_hierarchy(hierarchy, n, subtree) {
        if node < n {
            edges.push(CondensedEdge {
                parent,
                child: node,
                lambda,
                child_size: 1,
            });
        }
        ignore[node] = true;
    }
}

/// Excess-of-mass selection. Returns one flag per cluster (root at index 0).
fn select_clusters(tree: &CondensedTree) -> Vec<bool> {
    let n = tree.n_points;
    let count = tree.n_clusters;

    let mut birth = vec![0.0f64; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in tree.edges.iter().filter(|e| e.child >= n) {
        birth[edge.child - n] = edge.lambda;
        children[edge.parent - n].push(edge.child - n);
    }

    let mut stability = vec![0.0f64; count];
    for edge in &tree.edges {
        let parent = edge.parent - n;
        stability[parent] += edge.child_size as f64 * persistence(edge.lambda, birth[parent]);
    }

    let mut selected = vec![true; count];
    selected[0] = false;

    // Children always carry higher ids than their parent, so a reverse scan
    // is bottom-up.
    for cluster in (1..count).rev() {
        let subtree: f64 = children[cluster].iter().map(|&c| stability[c]).sum();
        if subtree > stability[cluster] {
            selected[cluster] = false;
            stability[cluster] = subtree;
        } else {
            deselect_descendants(&children, cluster, &mut selected);
        }
    }

    selected
}

fn deselect_descendants(children: &[Vec<usize>], node: usize, selected: &mut [bool]) {
    for &child in &children[node] {
        selected[child] = false;
        deselect_descendants(children, child, selected);
    }
}

fn assign_labels(tree: &CondensedTree, selected: &[bool]) -> Vec<ClusterLabel> {
    let n = tree.n_points;

    let mut cluster_parent: Vec<Option<usize>> = vec![None; tree.n_clusters];
    for edge in tree.edges.iter().filter(|e| e.child >= n) {
        cluster_parent[edge.child - n] = Some(edge.parent - n);
    }

    let mut label_of: Vec<Option<usize>> = vec![None; tree.n_clusters];
    let mut next_label = 0;
    for (cluster, _) in selected.iter().enumerate().filter(|&(_, &sel)| sel) {
        label_of[cluster] = Some(next_label);
        next_label += 1;
    }

    let mut labels = vec![ClusterLabel::Noise; n];
    for edge in tree.edges.iter().filter(|e| e.child < n) {
        let mut current = Some(edge.parent - n);
        while let Some(cluster) = current {
            if let Some(label) = label_of[cluster] {
                labels[edge.child] = ClusterLabel::Cluster(label);
                break;
            }
            current = cluster_parent[cluster];
        }
    }

    labels
}
