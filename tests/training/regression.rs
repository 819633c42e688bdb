//! Pointwise losses, input validation and determinism.

use gbforest::repr::{Node, SplitCondition};
use gbforest::testing::data::{synthetic_binary, synthetic_mixed, synthetic_regression};
use gbforest::testing::{assert_scores_approx_eq, assert_scores_identical};
use gbforest::training::{LossFunction, TrainingConfig};
use gbforest::{DataStore, Error, GBDTTrainer};

fn config(data_features: &[String], categorical: &[String]) -> TrainingConfig {
    TrainingConfig::builder()
        .float_feature(data_features.to_vec())
        .categorical_feature(categorical.to_vec())
        .num_threads(1)
        .build()
        .unwrap()
}

#[test]
fn four_rows_split_between_one_and_two() {
    let mut store = DataStore::new();
    store
        .add_bucketized_float_column("x", &[0.0, 1.0, 2.0, 3.0], 256)
        .unwrap();
    let config = TrainingConfig {
        num_trees: 1,
        shrinkage: 1.0,
        ..config(&["x".to_string()], &[])
    };
    let y = [0.0, 0.0, 1.0, 1.0];
    let forest = GBDTTrainer::new(config).train(&store, &y, &[], None).unwrap();

    assert_eq!(forest.n_trees(), 1);
    match forest.tree(0).node(0) {
        Node::Branch { split, .. } => match split.condition {
            SplitCondition::Float { threshold, .. } => {
                assert!(threshold > 1.0 && threshold < 2.0, "threshold {threshold}")
            }
            ref other => panic!("unexpected condition {other:?}"),
        },
        other => panic!("root is not a branch: {other:?}"),
    }
    let scores = forest.predict(&store).unwrap();
    assert_scores_approx_eq(scores.as_slice().unwrap(), &y, 1e-12, "scores");
}

#[test]
fn missing_values_split_from_present_values() {
    let mut store = DataStore::new();
    let nan = f64::NAN;
    store
        .add_raw_float_column("x", vec![1.0, 1.0, 1.0, nan, nan, nan])
        .unwrap();
    let config = TrainingConfig {
        num_trees: 1,
        num_leaves: 2,
        shrinkage: 1.0,
        ..config(&["x".to_string()], &[])
    };
    let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let forest = GBDTTrainer::new(config).train(&store, &y, &[], None).unwrap();

    assert_eq!(forest.tree(0).n_nodes(), 3);
    match forest.tree(0).node(0) {
        Node::Branch { split, .. } => assert_eq!(
            split.condition,
            SplitCondition::Float {
                threshold: 1.0,
                missing_to_right: false,
            }
        ),
        other => panic!("root is not a branch: {other:?}"),
    }
    let scores = forest.predict(&store).unwrap();
    assert_scores_approx_eq(scores.as_slice().unwrap(), &y, 1e-12, "scores");
}

#[test]
fn zero_example_sampling_rate_is_a_config_error() {
    let data = synthetic_regression(100, 2, 1, 0.0);
    let config = TrainingConfig {
        example_sampling_rate: 0.0,
        ..config(&data.float_features, &[])
    };
    let result = GBDTTrainer::new(config).train(&data.store, &data.targets, &[], None);
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn training_loss_decreases() {
    let data = synthetic_regression(2000, 4, 3, 0.05);
    let config = TrainingConfig {
        num_trees: 20,
        ..config(&data.float_features, &[])
    };
    let trainer = GBDTTrainer::new(config);
    let mut session = trainer.start(&data.store, &data.targets, &[], None).unwrap();
    let mut losses = Vec::new();
    while let Some(report) = session.next_tree().unwrap() {
        assert!(report.n_leaves >= 1);
        assert_eq!(report.n_sampled_rows, 2000);
        losses.push(report.loss);
    }
    assert_eq!(losses.len(), 20);
    assert!(losses[19] < losses[0] * 0.5, "losses {losses:?}");
    assert_eq!(session.into_forest().n_trees(), 20);
}

#[test]
fn logloss_separates_classes() {
    let data = synthetic_binary(2000, 3, 5, 0.0);
    let config = TrainingConfig {
        loss_func: LossFunction::Logloss,
        num_trees: 30,
        shrinkage: 0.3,
        ..config(&data.float_features, &[])
    };
    let forest = GBDTTrainer::new(config)
        .train(&data.store, &data.targets, &[], None)
        .unwrap();
    let scores = forest.predict(&data.store).unwrap();
    let correct = scores
        .iter()
        .zip(&data.targets)
        .filter(|(s, y)| s.signum() == y.signum())
        .count();
    assert!(correct as f64 / 2000.0 > 0.9, "accuracy {correct}/2000");
}

#[test]
fn huberized_hinge_trains_finite_scores() {
    let data = synthetic_binary(500, 2, 8, 0.1);
    let config = TrainingConfig {
        loss_func: LossFunction::HuberizedHinge,
        num_trees: 10,
        ..config(&data.float_features, &[])
    };
    let forest = GBDTTrainer::new(config)
        .train(&data.store, &data.targets, &[], None)
        .unwrap();
    assert!(forest.predict(&data.store).unwrap().iter().all(|s| s.is_finite()));
}

#[test]
fn depth_bound_limits_leaves() {
    let data = synthetic_mixed(1000, 3, 2);
    let config = TrainingConfig {
        num_trees: 5,
        max_depth: Some(2),
        ..config(&data.float_features, &data.categorical_features)
    };
    let forest = GBDTTrainer::new(config)
        .train(&data.store, &data.targets, &[], None)
        .unwrap();
    for tree in forest.trees() {
        assert!(tree.n_leaves() <= 4);
    }
}

#[test]
fn targets_from_the_store() {
    let data = synthetic_regression(300, 2, 4, 0.0);
    let config = TrainingConfig {
        num_trees: 3,
        target_column: Some("y".into()),
        ..config(&data.float_features, &[])
    };
    let trainer = GBDTTrainer::new(config);
    let from_store = trainer.train_from_store(&data.store, None).unwrap();
    let explicit = trainer.train(&data.store, &data.targets, &[], None).unwrap();
    assert_eq!(from_store, explicit);
}

#[test]
fn thread_count_does_not_change_the_forest() {
    // Two histogram shards, row and feature sampling, a categorical feature.
    let data = synthetic_mixed(20_000, 4, 11);
    let base = TrainingConfig {
        num_trees: 4,
        num_leaves: 16,
        example_sampling_rate: 0.8,
        feature_sampling_rate: 0.8,
        ..config(&data.float_features, &data.categorical_features)
    };
    let train = |num_threads| {
        let config = TrainingConfig { num_threads, ..base.clone() };
        GBDTTrainer::new(config)
            .train(&data.store, &data.targets, &[], None)
            .unwrap()
    };
    let sequential = train(1);
    let parallel = train(4);
    assert_eq!(sequential.trees(), parallel.trees());
    assert_eq!(sequential.base_score().to_bits(), parallel.base_score().to_bits());

    let a = sequential.predict(&data.store).unwrap();
    let b = parallel.predict(&data.store).unwrap();
    assert_scores_identical(a.as_slice().unwrap(), b.as_slice().unwrap(), "scores");

    // Same thread count twice.
    assert_eq!(train(4).trees(), parallel.trees());
}

#[test]
fn input_errors() {
    let data = synthetic_mixed(50, 1, 0);
    let trainer = GBDTTrainer::new(config(&data.float_features, &data.categorical_features));

    let short = &data.targets[..10];
    assert!(matches!(
        trainer.train(&data.store, short, &[], None),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        trainer.train(&data.store, &data.targets, &[1.0; 3], None),
        Err(Error::Validation(_))
    ));

    let no_features = GBDTTrainer::new(config(&[], &[]));
    assert!(matches!(
        no_features.train(&data.store, &data.targets, &[], None),
        Err(Error::Validation(_))
    ));

    let missing = GBDTTrainer::new(config(&["nope".to_string()], &[]));
    assert!(matches!(
        missing.train(&data.store, &data.targets, &[], None),
        Err(Error::NotFound(_))
    ));

    let string_as_float = GBDTTrainer::new(config(&["cat".to_string()], &[]));
    assert!(matches!(
        string_as_float.train(&data.store, &data.targets, &[], None),
        Err(Error::TypeMismatch { .. })
    ));
}
