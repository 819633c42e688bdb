//! Continuing training from a base forest.

use gbforest::testing::assert_scores_approx_eq;
use gbforest::testing::data::synthetic_mixed;
use gbforest::training::TrainingConfig;
use gbforest::{Error, GBDTTrainer};

#[test]
fn resumed_forest_keeps_the_base_trees() {
    let data = synthetic_mixed(800, 3, 13);
    let first = TrainingConfig::builder()
        .float_feature(data.float_features.clone())
        .categorical_feature(data.categorical_features.clone())
        .num_trees(5)
        .shrinkage(0.2)
        .num_threads(1)
        .build()
        .unwrap();
    let base = GBDTTrainer::new(first.clone())
        .train(&data.store, &data.targets, &[], None)
        .unwrap();

    let second = TrainingConfig {
        shrinkage: 0.1,
        num_trees: 4,
        ..first
    };
    let resumed = GBDTTrainer::new(second)
        .train(&data.store, &data.targets, &[], Some(&base))
        .unwrap();

    assert_eq!(resumed.n_trees(), 9);
    assert_eq!(resumed.base_score(), base.base_score());
    assert_eq!(resumed.shrinkage(), 0.1);

    let before = base.predict(&data.store).unwrap();
    let prefix = resumed.truncated(5).unwrap().predict(&data.store).unwrap();
    assert_scores_approx_eq(prefix.as_slice().unwrap(), before.as_slice().unwrap(), 1e-9, "prefix");

    let mse = |scores: &[f64]| {
        scores.iter().zip(&data.targets).map(|(s, y)| (s - y) * (s - y)).sum::<f64>() / scores.len() as f64
    };
    let after = resumed.predict(&data.store).unwrap();
    assert!(mse(after.as_slice().unwrap()) < mse(before.as_slice().unwrap()));
}

#[test]
fn resume_with_conflicting_feature_kind_fails() {
    let data = synthetic_mixed(200, 2, 3);
    let config = TrainingConfig::builder()
        .float_feature(data.float_features.clone())
        .categorical_feature(data.categorical_features.clone())
        .num_trees(3)
        .num_threads(1)
        .build()
        .unwrap();
    let base = GBDTTrainer::new(config.clone())
        .train(&data.store, &data.targets, &[], None)
        .unwrap();

    // `f0` is float in the base forest.
    let conflicting = TrainingConfig {
        float_feature: vec!["f1".into()],
        categorical_feature: vec!["cat".into(), "f0".into()],
        ..config
    };
    assert!(matches!(
        GBDTTrainer::new(conflicting).train(&data.store, &data.targets, &[], Some(&base)),
        Err(Error::Validation(_))
    ));
}
