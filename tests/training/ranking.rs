//! Pairwise ranking losses over query groups.

use rstest::rstest;

use gbforest::testing::data::{synthetic_ranking, SyntheticData};
use gbforest::training::{LossFunction, TrainingConfig};
use gbforest::GBDTTrainer;

fn ranking_config(data: &SyntheticData, loss: LossFunction) -> TrainingConfig {
    TrainingConfig::builder()
        .loss_func(loss)
        .float_feature(data.float_features.clone())
        .group_column("query".into())
        .num_trees(40)
        .num_leaves(8)
        .shrinkage(0.2)
        .num_threads(1)
        .build()
        .unwrap()
}

/// Fraction of within-group pairs with different targets that the scores
/// order strictly correctly.
fn concordance(scores: &[f64], targets: &[f64], group_size: usize) -> f64 {
    let (mut good, mut total) = (0usize, 0usize);
    for start in (0..scores.len()).step_by(group_size) {
        for i in start..start + group_size {
            for j in start..start + group_size {
                if targets[i] > targets[j] {
                    total += 1;
                    if scores[i] > scores[j] {
                        good += 1;
                    }
                }
            }
        }
    }
    good as f64 / total as f64
}

#[rstest]
#[case::auc(LossFunction::Auc)]
#[case::pairwise_logloss(LossFunction::PairwiseLogloss)]
#[case::gbrank(LossFunction::Gbrank)]
#[case::lambdamart(LossFunction::Lambdamart)]
fn pairwise_losses_learn_the_order(#[case] loss: LossFunction) {
    let data = synthetic_ranking(40, 10, 3, 21);
    let forest = GBDTTrainer::new(ranking_config(&data, loss))
        .train(&data.store, &data.targets, &[], None)
        .unwrap();
    assert_eq!(forest.base_score(), 0.0);
    let scores = forest.predict(&data.store).unwrap();
    let c = concordance(scores.as_slice().unwrap(), &data.targets, 10);
    assert!(c > 0.65, "{loss:?}: concordance {c}");
}

#[rstest]
#[case::pair_weights(true, false)]
#[case::group_weights(false, true)]
fn pairwise_training_is_thread_independent(#[case] by_delta: bool, #[case] equal_groups: bool) {
    let data = synthetic_ranking(30, 8, 2, 5);
    let base = TrainingConfig {
        num_trees: 5,
        pair_sampling_rate: 0.5,
        pair_weight_by_delta_target: by_delta,
        equal_group_weight: equal_groups,
        ..ranking_config(&data, LossFunction::PairwiseLogloss)
    };
    let train = |num_threads| {
        GBDTTrainer::new(TrainingConfig { num_threads, ..base.clone() })
            .train(&data.store, &data.targets, &[], None)
            .unwrap()
    };
    assert_eq!(train(1).trees(), train(3).trees());
}

#[test]
fn without_group_column_all_rows_form_one_group() {
    let data = synthetic_ranking(1, 50, 2, 9);
    let config = TrainingConfig {
        group_column: None,
        num_trees: 10,
        ..ranking_config(&data, LossFunction::Gbrank)
    };
    let forest = GBDTTrainer::new(config)
        .train(&data.store, &data.targets, &[], None)
        .unwrap();
    assert_eq!(forest.n_trees(), 10);
}
