#[inline]
pub(crate) fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
pub(crate) fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt()
}

/// Union-find that gives every merge a fresh node id, producing the
/// single-linkage dendrogram.
///
/// Points are nodes `0..n`; the k-th merge creates node `n + k`.
#[derive(Clone, Debug)]
pub(crate) struct LinkageUnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    next_label: usize,
}

impl LinkageUnionFind {
    pub(crate) fn new(n: usize) -> Self {
        let capacity = 2 * n.max(1) - 1;
        Self {
            parent: (0..capacity).collect(),
            size: (0..capacity).map(|i| usize::from(i < n)).collect(),
            next_label: n,
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merge two roots under a new node and return it.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let merged = self.next_label;
        self.parent[a] = merged;
        self.parent[b] = merged;
        self.size[merged] = self.size[a] + self.size[b];
        self.next_label += 1;
        merged
    }

    pub(crate) fn size_of(&self, node: usize) -> usize {
        self.size[node]
    }
}

/// Compute an MST for a dense complete graph using Prim's algorithm.
///
/// `dist_fn(i, j)` returns the edge weight between points `i` and `j`.
/// Ties resolve to the lowest index, so the tree is deterministic.
/// Returns edges `(u, v, dist)`.
pub(crate) fn prim_mst(n: usize, dist_fn: impl Fn(usize, usize) -> f32) -> Vec<(usize, usize, f32)> {
    if n <= 1 {
        return Vec::new();
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f32::INFINITY; n];
    let mut parent = vec![usize::MAX; n];
    let mut edges = Vec::with_capacity(n - 1);

    let mut current = 0;
    in_tree[0] = true;

    for _ in 1..n {
        let mut next = usize::MAX;
        let mut next_dist = f32::INFINITY;
        for v in 0..n {
            if in_tree[v] {
                continue;
            }
            let d = dist_fn(current, v);
            if d < best[v] {
                best[v] = d;
                parent[v] = current;
            }
            if next == usize::MAX || best[v] < next_dist {
                next_dist = best[v];
                next = v;
            }
        }

        in_tree[next] = true;
        edges.push((parent[next], next, next_dist));
        current = next;
    }

    edges
}
