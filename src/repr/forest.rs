//! Canonical forest representation (collection of trees).
//!
//! Scoring lives in [`crate::inference`], importance and partial dependency in
//! [`crate::explainability`], and the JSON format in [`crate::persist`]; each
//! adds its own `impl Forest` block.

use crate::error::{Error, Result};
use crate::training::TrainingConfig;

use super::{FeatureTable, Tree};

/// Ordered trees plus the config that produced them.
///
/// The score of a row is `base_score + sum(shrinkage * tree_i(row))`, with
/// trees summed in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    config: TrainingConfig,
    base_score: f64,
    features: FeatureTable,
}

impl Forest {
    /// Empty forest for a config.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if a feature is listed twice.
    pub fn new(config: TrainingConfig, base_score: f64) -> Result<Self> {
        let features = FeatureTable::from_config(&config)
            .map_err(|name| Error::validation(format!("feature '{name}' is listed twice")))?;
        Ok(Self {
            trees: Vec::new(),
            config,
            base_score,
            features,
        })
    }

    /// Append a tree.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    #[inline]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Learning rate every leaf is multiplied by.
    #[inline]
    pub fn shrinkage(&self) -> f64 {
        self.config.shrinkage
    }

    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    #[inline]
    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// Which features any branch splits on, indexed like the feature table.
    pub fn used_features(&self) -> Vec<bool> {
        let mut used = vec![false; self.features.len()];
        for split in self.trees.iter().flat_map(Tree::splits) {
            used[split.feature as usize] = true;
        }
        used
    }

    /// The first `k` trees with the same config and base score.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `k` exceeds the number of trees.
    pub fn truncated(&self, k: usize) -> Result<Forest> {
        if k > self.trees.len() {
            return Err(Error::validation(format!(
                "cannot truncate a forest of {} trees to {k}",
                self.trees.len()
            )));
        }
        Ok(Self {
            trees: self.trees[..k].to_vec(),
            config: self.config.clone(),
            base_score: self.base_score,
            features: self.features.clone(),
        })
    }
}
