//! Scoring laws and introspection of trained forests.

use std::sync::OnceLock;

use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use gbforest::testing::assert_scores_identical;
use gbforest::testing::data::{synthetic_mixed, SyntheticData, CATEGORY_EFFECTS};
use gbforest::training::TrainingConfig;
use gbforest::{Error, FeatureValue, Forest, GBDTTrainer};

const ROWS: usize = 1500;

fn fixture() -> &'static (Forest, SyntheticData) {
    static FIXTURE: OnceLock<(Forest, SyntheticData)> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let data = synthetic_mixed(ROWS, 4, 29);
        let config = TrainingConfig::builder()
            .float_feature(data.float_features.clone())
            .categorical_feature(data.categorical_features.clone())
            .num_trees(30)
            .num_leaves(12)
            .shrinkage(0.3)
            .num_threads(1)
            .build()
            .unwrap();
        let forest = GBDTTrainer::new(config)
            .train(&data.store, &data.targets, &[], None)
            .unwrap();
        (forest, data)
    })
}

#[test]
fn checkpoints_match_truncated_forests() {
    let (forest, data) = fixture();
    let checkpoints = [30, 1, 12, 0, 12];
    let grid = forest.predict_at_checkpoints(&data.store, &checkpoints).unwrap();
    assert_eq!(grid.dim(), (checkpoints.len(), ROWS));
    for (row, &k) in checkpoints.iter().enumerate() {
        let expected = forest.truncated(k).unwrap().predict(&data.store).unwrap();
        let actual = grid.row(row).to_vec();
        assert_scores_identical(&actual, expected.as_slice().unwrap(), &format!("checkpoint {k}"));
    }
}

#[test]
fn checkpoint_beyond_forest_size_fails() {
    let (forest, data) = fixture();
    assert!(matches!(
        forest.predict_at_checkpoints(&data.store, &[31]),
        Err(Error::Validation(_))
    ));
}

#[test]
fn prediction_is_repeatable() {
    let (forest, data) = fixture();
    let a = forest.predict(&data.store).unwrap();
    let b = forest.predict(&data.store).unwrap();
    assert_scores_identical(a.as_slice().unwrap(), b.as_slice().unwrap(), "repeat");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn slicing_commutes_with_scoring(rows in prop::collection::vec(0..ROWS, 1..60)) {
        let (forest, data) = fixture();
        let full = forest.predict(&data.store).unwrap();
        let sliced = forest.predict(&data.store.slice(&rows).unwrap()).unwrap();
        for (i, &r) in rows.iter().enumerate() {
            prop_assert_eq!(sliced[i].to_bits(), full[r].to_bits());
        }
    }
}

#[test]
fn importance_is_a_ranked_subset_of_the_features() {
    let (forest, data) = fixture();
    let ranked = forest.feature_importance();
    assert!(!ranked.is_empty());
    for (name, value) in &ranked {
        assert!(*value > 0.0);
        assert!(data.float_features.contains(name) || data.categorical_features.contains(name));
    }
    for pair in ranked.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
    let normalized = forest.feature_importance_normalized();
    assert_eq!(normalized[0].1, 1.0);
    assert!(normalized.iter().all(|(_, v)| *v > 0.0 && *v <= 1.0));
}

#[test]
fn partial_dependency_follows_category_effects() {
    let (forest, data) = fixture();
    let values: Vec<FeatureValue> = CATEGORY_EFFECTS.iter().map(|(c, _)| FeatureValue::from(*c)).collect();
    let points = forest.partial_dependency(&data.store, "cat", &values, None).unwrap();
    assert_eq!(points.len(), values.len());
    // Base defaults to the first value.
    assert_abs_diff_eq!(points[0].mean, 0.0);
    assert_abs_diff_eq!(points[0].std, 0.0);
    let first = points.first().unwrap().mean;
    let last = points.last().unwrap().mean;
    assert!(last - first > 1.0, "A -> E shift {}", last - first);
    // The caller's store keeps its categories.
    assert_eq!(data.store.column("cat").unwrap().kind(), gbforest::ColumnKind::String);
}

#[test]
fn partial_dependency_on_float_feature() {
    let (forest, data) = fixture();
    let values = [FeatureValue::Float(-0.5), FeatureValue::Float(0.5)];
    let points = forest
        .partial_dependency(&data.store, "f0", &values, Some(FeatureValue::Float(0.0)))
        .unwrap();
    assert_eq!(points.len(), 2);
    assert!(points.iter().all(|p| p.mean.is_finite() && p.std >= 0.0));
    assert!(matches!(
        forest.partial_dependency(&data.store, "f0", &[FeatureValue::from("A")], None),
        Err(Error::Validation(_))
    ));
}
