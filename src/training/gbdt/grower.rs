//! Tree grower for gradient boosting.
//!
//! Grows one tree from histograms of the sampled rows. Two policies:
//!
//! - leaf-wise: repeatedly split the open leaf with the largest gain (ties go
//!   to the smaller node id) until `max_leaves` is reached or no leaf can be
//!   split;
//! - depth-wise: split every splittable node of a level, in node order, then
//!   move to the next level, until `max_depth` or `max_leaves`.
//!
//! After a split only the smaller child's histogram is built from rows; the
//! larger one is the parent minus the smaller.

use crate::data::MISSING_CATEGORY;
use crate::repr::{MutableTree, NodeId, Split, SplitCondition, Tree};
use crate::training::{Gradients, GrowthStrategy};
use crate::utils::Parallelism;

use super::features::{FeatureBins, TrainingFeatures};
use super::histograms::{GradStat, NodeHistogram};
use super::partition::RowPartitioner;
use super::split::{RowRouter, SplitFinder, SplitInfo, SplitRule};

/// A leaf that may still be split.
struct Candidate {
    node: NodeId,
    depth: usize,
    histogram: NodeHistogram,
    split: Option<SplitInfo>,
}

/// Result of growing one tree.
#[derive(Debug, Clone)]
pub struct GrownTree {
    pub tree: Tree,
    pub n_leaves: usize,
}

/// Grows trees over one set of training features.
#[derive(Debug)]
pub struct TreeGrower<'f, 'a> {
    features: &'f TrainingFeatures<'a>,
    finder: SplitFinder,
    growth: GrowthStrategy,
    parallelism: Parallelism,
}

impl<'f, 'a> TreeGrower<'f, 'a> {
    pub fn new(
        features: &'f TrainingFeatures<'a>,
        finder: SplitFinder,
        growth: GrowthStrategy,
        parallelism: Parallelism,
    ) -> Self {
        Self {
            features,
            finder,
            growth,
            parallelism,
        }
    }

    /// Grow a tree on `rows` using only the features in `sampled`.
    ///
    /// `rows` and `sampled` must be ascending.
    pub fn grow(&self, rows: Vec<u32>, sampled: &[u32], gradients: &Gradients) -> GrownTree {
        let root_stat = GradStat::from_rows(&rows, gradients);
        let params = self.finder.params();
        let mut tree = MutableTree::new(params.leaf_value(root_stat.grad, root_stat.hess));
        let mut partitioner = RowPartitioner::new(rows);
        let root_hist = NodeHistogram::build(self.features, sampled, partitioner.rows(0), gradients, self.parallelism);
        let root = self.evaluate(0, 0, &root_stat, root_hist, sampled);

        let n_leaves = match self.growth {
            GrowthStrategy::LeafWise { max_leaves } => {
                self.grow_leaf_wise(root, max_leaves, &mut tree, &mut partitioner, sampled, gradients)
            }
            GrowthStrategy::DepthWise { max_leaves, .. } => {
                self.grow_depth_wise(root, max_leaves, &mut tree, &mut partitioner, sampled, gradients)
            }
        };
        GrownTree {
            tree: tree.freeze(),
            n_leaves,
        }
    }

    fn grow_leaf_wise(
        &self,
        root: Candidate,
        max_leaves: usize,
        tree: &mut MutableTree,
        partitioner: &mut RowPartitioner,
        sampled: &[u32],
        gradients: &Gradients,
    ) -> usize {
        let mut open = vec![root];
        let mut n_leaves = 1;
        while n_leaves < max_leaves {
            let Some(pos) = best_candidate(&open) else {
                break;
            };
            let Candidate {
                node,
                depth,
                histogram,
                split: Some(split),
            } = open.swap_remove(pos)
            else {
                break;
            };
            let (left, right) = self.apply(node, depth, histogram, split, tree, partitioner, sampled, gradients);
            open.push(left);
            open.push(right);
            n_leaves += 1;
        }
        n_leaves
    }

    fn grow_depth_wise(
        &self,
        root: Candidate,
        max_leaves: usize,
        tree: &mut MutableTree,
        partitioner: &mut RowPartitioner,
        sampled: &[u32],
        gradients: &Gradients,
    ) -> usize {
        let mut level = vec![root];
        let mut n_leaves = 1;
        while !level.is_empty() {
            let mut next = Vec::with_capacity(level.len() * 2);
            for candidate in level {
                if n_leaves >= max_leaves {
                    return n_leaves;
                }
                let Candidate {
                    node,
                    depth,
                    histogram,
                    split: Some(split),
                } = candidate
                else {
                    continue;
                };
                let (left, right) = self.apply(node, depth, histogram, split, tree, partitioner, sampled, gradients);
                next.push(left);
                next.push(right);
                n_leaves += 1;
            }
            level = next;
        }
        n_leaves
    }

    /// Search a node for its best split, unless the depth bound forbids one.
    fn evaluate(
        &self,
        node: NodeId,
        depth: usize,
        stat: &GradStat,
        histogram: NodeHistogram,
        sampled: &[u32],
    ) -> Candidate {
        let depth_ok = match self.growth {
            GrowthStrategy::DepthWise { max_depth, .. } => depth < max_depth,
            GrowthStrategy::LeafWise { .. } => true,
        };
        let split = if depth_ok {
            self.finder
                .find_best(self.features, sampled, &histogram, stat, self.parallelism)
        } else {
            None
        };
        Candidate {
            node,
            depth,
            histogram,
            split,
        }
    }

    /// Split a node and return its evaluated children.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        node: NodeId,
        depth: usize,
        histogram: NodeHistogram,
        split: SplitInfo,
        tree: &mut MutableTree,
        partitioner: &mut RowPartitioner,
        sampled: &[u32],
        gradients: &Gradients,
    ) -> (Candidate, Candidate) {
        let params = self.finder.params();
        let bins = self.features.feature(split.feature);
        let (left, right) = tree.split_leaf(
            node,
            self.to_tree_split(&split, bins),
            params.leaf_value(split.left.grad, split.left.hess),
            params.leaf_value(split.right.grad, split.right.hess),
        );

        let router = RowRouter::new(&split.rule);
        let (n_left, n_right) = partitioner.split(node, left, right, |row| router.goes_left(bins, row as usize));
        debug_assert_eq!(n_left, split.left.count as usize);
        debug_assert_eq!(n_right, split.right.count as usize);

        let (small, small_stat, large, large_stat) = if n_left <= n_right {
            (left, &split.left, right, &split.right)
        } else {
            (right, &split.right, left, &split.left)
        };
        let small_hist =
            NodeHistogram::build(self.features, sampled, partitioner.rows(small), gradients, self.parallelism);
        let large_hist = histogram.subtract(&small_hist);
        drop(histogram);

        let small = self.evaluate(small, depth + 1, small_stat, small_hist, sampled);
        let large = self.evaluate(large, depth + 1, large_stat, large_hist, sampled);
        if small.node == left {
            (small, large)
        } else {
            (large, small)
        }
    }

    fn to_tree_split(&self, split: &SplitInfo, bins: &FeatureBins<'_>) -> Split {
        let condition = match &split.rule {
            SplitRule::Float {
                threshold,
                missing_to_right,
                ..
            } => SplitCondition::Float {
                threshold: *threshold,
                missing_to_right: *missing_to_right,
            },
            SplitRule::Categorical { left_codes } => {
                let categories = match bins {
                    FeatureBins::Categorical(column) => {
                        let dictionary = column.dictionary();
                        left_codes
                            .iter()
                            .map(|&code| dictionary.value_of(code).unwrap_or(MISSING_CATEGORY).to_string())
                            .collect()
                    }
                    FeatureBins::Float(_) => Vec::new(),
                };
                SplitCondition::Categorical { categories }
            }
        };
        Split {
            feature: split.feature,
            gain: split.gain,
            condition,
        }
    }
}

/// Open leaf with the largest gain; ties go to the smaller node id.
fn best_candidate(open: &[Candidate]) -> Option<usize> {
    let mut best: Option<(usize, f64, NodeId)> = None;
    for (pos, candidate) in open.iter().enumerate() {
        let Some(split) = &candidate.split else {
            continue;
        };
        let better = match best {
            None => true,
            Some((_, gain, node)) => split.gain > gain || (split.gain == gain && candidate.node < node),
        };
        if better {
            best = Some((pos, split.gain, candidate.node));
        }
    }
    best.map(|(pos, _, _)| pos)
}
