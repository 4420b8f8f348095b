//! Isolation-forest ensemble.
//!
//! Each tree recursively partitions a subsample of the rows along randomly
//! chosen feature/threshold pairs. Rows that end up in shallow leaves were
//! easy to isolate and score closer to 1; rows deep in the tree score closer
//! to 0.5 or below. The ensemble is fit from scratch for every call and never
//! persisted.

use fastrand::Rng;

// Euler-Mascheroni constant, used by the average-path-length normalizer.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected average path length of an unsuccessful BST search over `n` items.
/// This is the `c(n)` normalizer from the isolation-forest formulation.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let nf = n as f64;
            2.0 * ((nf - 1.0).ln() + EULER_GAMMA) - 2.0 * (nf - 1.0) / nf
        }
    }
}

enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow one tree over the rows named by `sample`, depth-capped at
    /// `height_limit`.
    fn fit(data: &[Vec<f32>], sample: &mut Vec<usize>, height_limit: usize, rng: &mut Rng) -> Self {
        let mut nodes = Vec::new();
        let len = sample.len();
        Self::build(data, sample, 0, len, 0, height_limit, rng, &mut nodes);
        Self { nodes }
    }

    /// Build the subtree over `sample[start..end]`, appending nodes to the
    /// arena and returning the new node's index. The index range is
    /// partitioned in place so no per-level allocations are needed.
    #[allow(clippy::too_many_arguments)]
    fn build(
        data: &[Vec<f32>],
        sample: &mut Vec<usize>,
        start: usize,
        end: usize,
        depth: usize,
        height_limit: usize,
        rng: &mut Rng,
        nodes: &mut Vec<Node>,
    ) -> usize {
        let size = end - start;
        if size <= 1 || depth >= height_limit {
            nodes.push(Node::Leaf { size });
            return nodes.len() - 1;
        }

        // Pick a split among features that still have spread; a region where
        // every remaining row is identical cannot be split further.
        let Some((feature, threshold)) = pick_split(data, &sample[start..end], rng) else {
            nodes.push(Node::Leaf { size });
            return nodes.len() - 1;
        };

        let mut mid = start;
        for i in start..end {
            if f64::from(data[sample[i]][feature]) < threshold {
                sample.swap(i, mid);
                mid += 1;
            }
        }

        // Reserve our slot before recursing so child indices are stable.
        let node_id = nodes.len();
        nodes.push(Node::Leaf { size });

        let left = Self::build(data, sample, start, mid, depth + 1, height_limit, rng, nodes);
        let right = Self::build(data, sample, mid, end, depth + 1, height_limit, rng, nodes);
        nodes[node_id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_id
    }

    /// Path length of `point` through this tree, with the standard `c(size)`
    /// adjustment at non-singleton leaves.
    fn path_length(&self, point: &[f32]) -> f64 {
        let mut node_id = 0usize;
        let mut depth = 0usize;
        loop {
            match &self.nodes[node_id] {
                Node::Leaf { size } => {
                    return depth as f64 + average_path_length(*size);
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node_id = if f64::from(point[*feature]) < *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1;
                }
            }
        }
    }
}

/// Choose a random feature with spread and a uniform threshold inside its
/// range. Returns `None` when every feature is constant over the rows.
fn pick_split(data: &[Vec<f32>], rows: &[usize], rng: &mut Rng) -> Option<(usize, f64)> {
    let dim = data[rows[0]].len();
    if dim == 0 {
        return None;
    }

    // Random starting offset, then scan until a splittable feature turns up,
    // avoiding a candidate-set allocation per node.
    let offset = rng.usize(..dim);
    for step in 0..dim {
        let feature = (offset + step) % dim;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &row in rows {
            let v = f64::from(data[row][feature]);
            min = min.min(v);
            max = max.max(v);
        }
        if max > min {
            let threshold = min + (max - min) * rng.f64();
            return Some((feature, threshold));
        }
    }
    None
}

pub(crate) struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `tree_count` trees, each over an independent subsample of up to
    /// `max_samples` rows drawn without replacement.
    pub(crate) fn fit(
        data: &[Vec<f32>],
        tree_count: usize,
        max_samples: usize,
        rng: &mut Rng,
    ) -> Self {
        let n = data.len();
        let sample_size = max_samples.min(n);
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let mut indices: Vec<usize> = (0..n).collect();
        let mut trees = Vec::with_capacity(tree_count);
        for _ in 0..tree_count {
            // Partial Fisher-Yates: the first `sample_size` entries become the
            // subsample for this tree.
            for i in 0..sample_size {
                let j = i + rng.usize(..n - i);
                indices.swap(i, j);
            }
            let mut sample = indices[..sample_size].to_vec();
            trees.push(IsolationTree::fit(data, &mut sample, height_limit, rng));
        }

        Self { trees, sample_size }
    }

    /// Anomaly score in `(0, 1)` for one row: `2^(-E[h(x)] / c(sample_size))`.
    /// Higher means easier to isolate, i.e. more anomalous.
    pub(crate) fn score(&self, point: &[f32]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(point)).sum();
        let mean_path = total / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        if norm <= 0.0 {
            return 0.5;
        }
        2f64.powf(-mean_path / norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_length_normalizer_reference_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) ≈ 10.24 per the original isolation-forest paper.
        let c256 = average_path_length(256);
        assert!((c256 - 10.24).abs() < 0.05, "c(256) = {c256}");
    }

    #[test]
    fn distant_point_scores_higher() {
        let mut data: Vec<Vec<f32>> = (0..20)
            .map(|i| vec![(i % 5) as f32 * 0.1, (i % 3) as f32 * 0.1])
            .collect();
        data.push(vec![10.0, 10.0]);

        let mut rng = Rng::with_seed(7);
        let forest = IsolationForest::fit(&data, 100, 256, &mut rng);

        let outlier_score = forest.score(&data[20]);
        let max_inlier_score = data[..20]
            .iter()
            .map(|p| forest.score(p))
            .fold(f64::MIN, f64::max);
        assert!(
            outlier_score > max_inlier_score,
            "outlier {outlier_score} should exceed inliers {max_inlier_score}"
        );
    }

    #[test]
    fn seeded_fit_is_deterministic() {
        let data: Vec<Vec<f32>> = (0..30).map(|i| vec![i as f32, (i * 7 % 13) as f32]).collect();

        let mut rng_a = Rng::with_seed(99);
        let mut rng_b = Rng::with_seed(99);
        let forest_a = IsolationForest::fit(&data, 50, 16, &mut rng_a);
        let forest_b = IsolationForest::fit(&data, 50, 16, &mut rng_b);

        for point in &data {
            assert_eq!(forest_a.score(point), forest_b.score(point));
        }
    }

    #[test]
    fn identical_rows_produce_uniform_scores() {
        let data: Vec<Vec<f32>> = vec![vec![1.0, 2.0, 3.0]; 10];
        let mut rng = Rng::with_seed(1);
        let forest = IsolationForest::fit(&data, 20, 256, &mut rng);

        let scores: Vec<f64> = data.iter().map(|p| forest.score(p)).collect();
        let spread = scores.iter().cloned().fold(f64::MIN, f64::max)
            - scores.iter().cloned().fold(f64::MAX, f64::min);
        assert!(spread < 1e-12);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let data: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![(i as f32).sin(), (i as f32).cos(), i as f32 * 0.01])
            .collect();
        let mut rng = Rng::with_seed(3);
        let forest = IsolationForest::fit(&data, 100, 32, &mut rng);
        for point in &data {
            let s = forest.score(point);
            assert!((0.0..=1.0).contains(&s), "score {s} out of range");
        }
    }
}
