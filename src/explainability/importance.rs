//! Split-based feature importance.

use crate::repr::Forest;

/// What a split contributes to its feature's importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportanceType {
    /// Total gain of the feature's splits.
    #[default]
    Gain,
    /// Number of splits on the feature.
    Split,
}

/// Importance per feature, indexed like the forest's feature table.
pub fn compute_forest_importance(forest: &Forest, kind: ImportanceType) -> Vec<f64> {
    let mut totals = vec![0.0; forest.features().len()];
    for split in forest.trees().iter().flat_map(|tree| tree.splits()) {
        totals[split.feature as usize] += match kind {
            ImportanceType::Gain => split.gain,
            ImportanceType::Split => 1.0,
        };
    }
    totals
}

/// Feature importance methods.
impl Forest {
    /// `(feature, total gain)` for every feature with positive total gain,
    /// largest first, ties by name.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        self.feature_importance_by(ImportanceType::Gain)
    }

    /// [`feature_importance`](Self::feature_importance) divided by the
    /// largest value, so the top feature scores 1.
    pub fn feature_importance_normalized(&self) -> Vec<(String, f64)> {
        let mut ranked = self.feature_importance();
        if let Some(&(_, top)) = ranked.first() {
            for (_, value) in &mut ranked {
                *value /= top;
            }
        }
        ranked
    }

    /// Ranked importance of the given type; features scoring 0 are left out.
    pub fn feature_importance_by(&self, kind: ImportanceType) -> Vec<(String, f64)> {
        let totals = compute_forest_importance(self, kind);
        let mut ranked: Vec<(String, f64)> = self
            .features()
            .names()
            .iter()
            .zip(totals)
            .filter(|(_, value)| *value > 0.0)
            .map(|(name, value)| (name.clone(), value))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{MutableTree, Split, SplitCondition};
    use crate::training::TrainingConfig;

    fn split(feature: u32, gain: f64) -> Split {
        Split {
            feature,
            gain,
            condition: SplitCondition::Float {
                threshold: 0.0,
                missing_to_right: false,
            },
        }
    }

    fn forest() -> Forest {
        let config = TrainingConfig {
            float_feature: vec!["a".into(), "b".into(), "c".into(), "unused".into()],
            ..Default::default()
        };
        let mut forest = Forest::new(config, 0.0).unwrap();
        let mut tree = MutableTree::new(0.0);
        let (l, r) = tree.split_leaf(0, split(1, 4.0), 0.0, 0.0);
        tree.split_leaf(l, split(0, 1.0), 0.0, 0.0);
        tree.split_leaf(r, split(2, 3.0), 0.0, 0.0);
        forest.push_tree(tree.freeze());
        let mut tree = MutableTree::new(0.0);
        tree.split_leaf(0, split(0, 2.0), 0.0, 0.0);
        forest.push_tree(tree.freeze());
        forest
    }

    #[test]
    fn test_gain_ranking_with_name_ties() {
        let ranked = forest().feature_importance();
        assert_eq!(
            ranked,
            vec![("b".to_string(), 4.0), ("a".to_string(), 3.0), ("c".to_string(), 3.0)]
        );
    }

    #[test]
    fn test_normalized() {
        let ranked = forest().feature_importance_normalized();
        assert_eq!(ranked[0].1, 1.0);
        assert_eq!(ranked[1].1, 0.75);
    }

    #[test]
    fn test_split_counts() {
        let ranked = forest().feature_importance_by(ImportanceType::Split);
        assert_eq!(ranked[0], ("a".to_string(), 2.0));
        assert_eq!(ranked.len(), 3);
    }
}
