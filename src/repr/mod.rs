//! Canonical model representations: trees, forests and the feature table.

/// Canonical node identifier: an index into a tree's node arena.
pub type NodeId = u32;

pub mod forest;
pub mod tree;

pub use forest::Forest;
pub use tree::{MutableTree, Node, Split, SplitCondition, Tree, TreeValidationError};

use std::collections::HashMap;

use crate::training::TrainingConfig;

/// How a feature is split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Float,
    Categorical,
}

/// Feature names in canonical order (float features, then categorical ones).
///
/// Split nodes refer to features by their index in this table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureTable {
    names: Vec<String>,
    kinds: Vec<FeatureKind>,
    index: HashMap<String, u32>,
}

impl FeatureTable {
    /// Build from a config's feature lists.
    ///
    /// Returns the first duplicated name on failure.
    pub fn from_config(config: &TrainingConfig) -> Result<Self, String> {
        let mut table = Self::default();
        let listed = config
            .float_feature
            .iter()
            .map(|n| (n, FeatureKind::Float))
            .chain(config.categorical_feature.iter().map(|n| (n, FeatureKind::Categorical)));
        for (name, kind) in listed {
            if table.index.contains_key(name) {
                return Err(name.clone());
            }
            table.index.insert(name.clone(), table.names.len() as u32);
            table.names.push(name.clone());
            table.kinds.push(kind);
        }
        Ok(table)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn name(&self, feature: u32) -> &str {
        &self.names[feature as usize]
    }

    #[inline]
    pub fn kind(&self, feature: u32) -> FeatureKind {
        self.kinds[feature as usize]
    }

    /// Index of a feature by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(index, name, kind)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str, FeatureKind)> {
        self.names
            .iter()
            .zip(self.kinds.iter())
            .enumerate()
            .map(|(i, (n, &k))| (i as u32, n.as_str(), k))
    }
}
