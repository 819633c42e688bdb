//! GBDT Trainer for gradient boosting.
//!
//! This module provides the main training loop for gradient boosted decision
//! trees. It orchestrates sampling, gradient computation, tree growing and
//! score updates.
//!
//! Training is an explicit state machine: [`GBDTTrainer::start`] validates
//! everything and returns a [`BoostingSession`]; each
//! [`BoostingSession::next_tree`] call adds exactly one tree. A caller can
//! stop after any tree and take the forest grown so far.
//!
//! # Example
//!
//! ```
//! use gbforest::data::DataStore;
//! use gbforest::training::{GBDTTrainer, TrainingConfig};
//!
//! let mut store = DataStore::new();
//! store.add_bucketized_float_column("x", &[0.0, 1.0, 2.0, 3.0], 256).unwrap();
//!
//! let config = TrainingConfig::builder()
//!     .float_feature(vec!["x".into()])
//!     .num_trees(1)
//!     .shrinkage(1.0)
//!     .build()
//!     .unwrap();
//! let forest = GBDTTrainer::new(config)
//!     .train(&store, &[0.0, 0.0, 1.0, 1.0], &[], None)
//!     .unwrap();
//!
//! let scores = forest.predict(&store).unwrap();
//! assert!((scores[0] - 0.0).abs() < 1e-9);
//! assert!((scores[3] - 1.0).abs() < 1e-9);
//! ```

use std::borrow::Cow;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::DataStore;
use crate::error::{Error, Result};
use crate::inference::{ColumnBinding, CompiledTree, Predictor, DEFAULT_BLOCK_SIZE};
use crate::repr::{FeatureKind, Forest};
use crate::training::logger::TrainingLogger;
use crate::training::objectives::Objective;
use crate::training::sampling::{sample_features, sample_rows};
use crate::training::target::{resolve_targets, resolve_weights, Groups};
use crate::training::{Gradients, GrowthStrategy, TrainingConfig};
use crate::utils::{Parallelism, WorkerPool};

use super::features::TrainingFeatures;
use super::grower::TreeGrower;
use super::split::{GainParams, SplitFinder};

// =============================================================================
// IterationReport
// =============================================================================

/// What one boosting iteration did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Zero-based index of the iteration within this session.
    pub iteration: usize,
    /// Weighted mean loss before the tree was added.
    pub loss: f64,
    pub n_leaves: usize,
    pub n_sampled_rows: usize,
}

// =============================================================================
// GBDTTrainer
// =============================================================================

/// Gradient boosted decision tree trainer.
#[derive(Debug, Clone)]
pub struct GBDTTrainer {
    config: TrainingConfig,
}

impl GBDTTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Validate inputs and set up a session.
    ///
    /// `weights` may be empty for uniform weights. With a `base` forest the
    /// new forest starts from its trees and base score.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an invalid config, mismatched lengths, an
    ///   empty feature set or invalid weights and targets.
    /// - [`Error::NotFound`] / [`Error::TypeMismatch`] for feature columns.
    pub fn start<'a>(
        &self,
        store: &'a DataStore,
        targets: &'a [f64],
        weights: &'a [f64],
        base: Option<&Forest>,
    ) -> Result<BoostingSession<'a>> {
        let mut config = self.config.clone();
        if let Some(base) = base {
            adopt_base_features(&mut config, base)?;
        }
        config.validate()?;

        let n_rows = store.n_rows();
        if config.features().next().is_none() {
            return Err(Error::validation("no float or categorical features configured"));
        }
        if n_rows == 0 {
            return Err(Error::validation("the training store has no rows"));
        }
        if targets.len() != n_rows {
            return Err(Error::validation(format!(
                "{} targets for {n_rows} rows",
                targets.len()
            )));
        }
        let weights: Cow<'a, [f64]> = if weights.is_empty() {
            Cow::Owned(vec![1.0; n_rows])
        } else if weights.len() != n_rows {
            return Err(Error::validation(format!(
                "{} weights for {n_rows} rows",
                weights.len()
            )));
        } else {
            Cow::Borrowed(weights)
        };
        if let Some(row) = weights.iter().position(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(Error::validation(format!(
                "weight of row {row} must be finite and non-negative"
            )));
        }

        let groups = if config.loss_func.is_pairwise() {
            Groups::resolve(store, &config)?
        } else {
            Groups::single(n_rows)
        };
        let objective = Objective::new(&config, targets, &groups)?;

        let pool = WorkerPool::new(config.num_threads)?;
        let mut logger = TrainingLogger::new(config.verbosity);

        let (forest, base_trees) = match base {
            Some(base) => (resume_forest(&config, base)?, base.n_trees()),
            None => {
                let base_score = if config.use_initial_score {
                    objective.initial_score(targets, &weights)
                } else {
                    0.0
                };
                (Forest::new(config.clone(), base_score)?, 0)
            }
        };

        let table = forest.features().clone();
        let features = TrainingFeatures::resolve(store, &table, config.num_buckets)?;
        let binding = ColumnBinding::bind(store, &table, &vec![true; table.len()])?;

        let scores = if base_trees > 0 {
            let predictor = Predictor::new(&forest, store)?;
            pool.install(|parallelism| predictor.predict(parallelism)).to_vec()
        } else {
            vec![forest.base_score(); n_rows]
        };
        if let Some(row) = scores.iter().position(|s| !s.is_finite()) {
            return Err(Error::validation(format!("starting score of row {row} is not finite")));
        }

        logger.start_training(config.num_trees, n_rows, table.len(), &config);
        if base_trees > 0 {
            logger.log_resume(base_trees);
        }

        Ok(BoostingSession {
            finder: SplitFinder::new(GainParams::from_config(&config), config.categorical_split),
            growth: config.growth_strategy(),
            config,
            features,
            binding,
            targets,
            weights,
            objective,
            gradients: Gradients::new(n_rows),
            scores,
            forest,
            logger,
            pool,
            iteration: 0,
        })
    }

    /// Train `num_trees` trees and return the forest.
    pub fn train(
        &self,
        store: &DataStore,
        targets: &[f64],
        weights: &[f64],
        base: Option<&Forest>,
    ) -> Result<Forest> {
        let mut session = self.start(store, targets, weights, base)?;
        while session.next_tree()?.is_some() {}
        Ok(session.into_forest())
    }

    /// Train with targets and weights taken from the config's
    /// `target_column` and `weight_column`.
    pub fn train_from_store(&self, store: &DataStore, base: Option<&Forest>) -> Result<Forest> {
        let targets = resolve_targets(store, &self.config)?;
        let weights = resolve_weights(store, &self.config)?;
        self.train(store, &targets, &weights, base)
    }
}

/// Append features the base forest splits on but `config` does not list.
fn adopt_base_features(config: &mut TrainingConfig, base: &Forest) -> Result<()> {
    let used = base.used_features();
    for (index, name, kind) in base.features().iter() {
        let listed_float = config.float_feature.iter().any(|f| f == name);
        let listed_categorical = config.categorical_feature.iter().any(|f| f == name);
        match kind {
            FeatureKind::Float if listed_categorical => {
                return Err(Error::validation(format!(
                    "feature '{name}' is float in the base forest but categorical in the config"
                )));
            }
            FeatureKind::Categorical if listed_float => {
                return Err(Error::validation(format!(
                    "feature '{name}' is categorical in the base forest but float in the config"
                )));
            }
            _ => {}
        }
        if listed_float || listed_categorical || !used[index as usize] {
            continue;
        }
        match kind {
            FeatureKind::Float => config.float_feature.push(name.to_string()),
            FeatureKind::Categorical => config.categorical_feature.push(name.to_string()),
        }
    }
    Ok(())
}

/// New forest holding the base trees, rescaled to the new shrinkage and
/// remapped to the new feature table.
fn resume_forest(config: &TrainingConfig, base: &Forest) -> Result<Forest> {
    let mut forest = Forest::new(config.clone(), base.base_score())?;
    let remap: Vec<u32> = base
        .features()
        .names()
        .iter()
        .map(|name| forest.features().get(name).unwrap_or(u32::MAX))
        .collect();
    let factor = base.shrinkage() / config.shrinkage;
    for tree in base.trees() {
        let mut tree = tree.clone();
        tree.remap_features(|f| remap[f as usize]);
        if factor != 1.0 {
            tree.scale_scores(factor);
        }
        forest.push_tree(tree);
    }
    Ok(forest)
}

// =============================================================================
// BoostingSession
// =============================================================================

/// Mutable state of one training call.
///
/// Scores of the training rows are kept up to date after every tree using
/// the same routing and summation order as [`Forest::predict`], so they are
/// exactly what predicting on the training store would return.
///
/// After an error the session should be dropped; the trees it already added
/// stay valid and can still be taken with [`into_forest`](Self::into_forest).
#[derive(Debug)]
pub struct BoostingSession<'a> {
    config: TrainingConfig,
    features: TrainingFeatures<'a>,
    binding: ColumnBinding<'a>,
    targets: &'a [f64],
    weights: Cow<'a, [f64]>,
    objective: Objective,
    finder: SplitFinder,
    growth: GrowthStrategy,
    gradients: Gradients,
    scores: Vec<f64>,
    forest: Forest,
    logger: TrainingLogger,
    pool: WorkerPool,
    iteration: usize,
}

impl<'a> BoostingSession<'a> {
    /// Add one tree, or return `None` once `num_trees` trees were added.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if a sampling rate selects no rows or features.
    /// - [`Error::Diverged`] if a score became NaN or infinite.
    pub fn next_tree(&mut self) -> Result<Option<IterationReport>> {
        if self.is_done() {
            return Ok(None);
        }
        let pool = self.pool.clone();
        let report = pool.install(|parallelism| self.step(parallelism))?;
        self.iteration += 1;
        Ok(Some(report))
    }

    fn step(&mut self, parallelism: Parallelism) -> Result<IterationReport> {
        let iteration = self.iteration;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed ^ iteration as u64);
        let rows = sample_rows(&mut rng, self.scores.len(), self.config.example_sampling_rate)?;
        let sampled = sample_features(&mut rng, self.features.n_features(), self.config.feature_sampling_rate)?;
        let pair_seed = rng.next_u64();

        let summary = self.objective.compute_gradients(
            &self.scores,
            self.targets,
            &self.weights,
            pair_seed,
            &mut self.gradients,
            parallelism,
        );
        let loss = summary.mean();

        let n_sampled_rows = rows.len();
        let grower = TreeGrower::new(&self.features, self.finder.clone(), self.growth, parallelism);
        let grown = grower.grow(rows, &sampled, &self.gradients);

        let compiled = CompiledTree::compile(&grown.tree, &self.binding);
        let shrinkage = self.config.shrinkage;
        let binding = &self.binding;
        parallelism.maybe_par_chunks_mut(&mut self.scores, DEFAULT_BLOCK_SIZE, |start, block| {
            for (i, score) in block.iter_mut().enumerate() {
                *score += shrinkage * compiled.score(binding, start + i);
            }
        });
        if self.scores.iter().any(|s| !s.is_finite()) {
            self.logger.warn(&format!("scores diverged at iteration {iteration}"));
            return Err(Error::Diverged { iteration });
        }

        self.forest.push_tree(grown.tree);
        self.logger.log_iteration(iteration, loss);
        self.logger.log_tree(iteration, grown.n_leaves, n_sampled_rows);
        Ok(IterationReport {
            iteration,
            loss,
            n_leaves: grown.n_leaves,
            n_sampled_rows,
        })
    }

    /// Whether all requested trees were added.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.iteration >= self.config.num_trees
    }

    /// Trees added by this session so far.
    #[inline]
    pub fn n_iterations(&self) -> usize {
        self.iteration
    }

    /// Current scores of the training rows.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Finish and take the forest.
    pub fn into_forest(self) -> Forest {
        self.logger.finish_training(self.forest.n_trees());
        self.forest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::Node;
    use approx::assert_abs_diff_eq;

    fn store() -> DataStore {
        let mut store = DataStore::new();
        store
            .add_bucketized_float_column("x", &[0.0, 1.0, 2.0, 3.0], 256)
            .unwrap();
        store
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            float_feature: vec!["x".into()],
            num_trees: 1,
            shrinkage: 1.0,
            num_threads: 1,
            verbosity: crate::training::Verbosity::Silent,
            ..Default::default()
        }
    }

    #[test]
    fn test_four_row_example() {
        let s = store();
        let forest = GBDTTrainer::new(config())
            .train(&s, &[0.0, 0.0, 1.0, 1.0], &[], None)
            .unwrap();
        assert_eq!(forest.n_trees(), 1);
        assert_abs_diff_eq!(forest.base_score(), 0.5);
        match forest.tree(0).node(0) {
            Node::Branch { split, .. } => assert_eq!(
                split.condition,
                crate::repr::SplitCondition::Float {
                    threshold: 1.5,
                    missing_to_right: false
                }
            ),
            Node::Leaf { .. } => panic!("expected a split"),
        }
        let scores = forest.predict(&s).unwrap();
        for (score, y) in scores.iter().zip([0.0, 0.0, 1.0, 1.0]) {
            assert_abs_diff_eq!(*score, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_session_scores_match_predict() {
        let s = store();
        let config = TrainingConfig {
            num_trees: 3,
            shrinkage: 0.3,
            ..config()
        };
        let targets = [0.0, 1.0, 0.0, 1.0];
        let mut session = GBDTTrainer::new(config).start(&s, &targets, &[], None).unwrap();
        let mut reports = Vec::new();
        while let Some(report) = session.next_tree().unwrap() {
            reports.push(report);
        }
        assert_eq!(reports.len(), 3);
        assert!(session.is_done());
        let scores = session.scores().to_vec();
        let forest = session.into_forest();
        assert_eq!(forest.predict(&s).unwrap().to_vec(), scores);
    }

    #[test]
    fn test_input_validation() {
        let s = store();
        let trainer = GBDTTrainer::new(config());
        assert!(matches!(trainer.train(&s, &[0.0; 3], &[], None), Err(Error::Validation(_))));
        assert!(matches!(
            trainer.train(&s, &[0.0; 4], &[1.0; 2], None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            trainer.train(&s, &[0.0; 4], &[1.0, -1.0, 1.0, 1.0], None),
            Err(Error::Validation(_))
        ));
        let no_features = GBDTTrainer::new(TrainingConfig {
            float_feature: vec![],
            ..config()
        });
        assert!(matches!(no_features.train(&s, &[0.0; 4], &[], None), Err(Error::Validation(_))));
        let zero_rate = GBDTTrainer::new(TrainingConfig {
            example_sampling_rate: 0.0,
            ..config()
        });
        assert!(matches!(zero_rate.train(&s, &[0.0; 4], &[], None), Err(Error::Validation(_))));
    }

    #[test]
    fn test_tiny_rate_fails_at_first_tree() {
        let s = store();
        let trainer = GBDTTrainer::new(TrainingConfig {
            example_sampling_rate: 0.05,
            ..config()
        });
        let mut session = trainer.start(&s, &[0.0, 0.0, 1.0, 1.0], &[], None).unwrap();
        assert!(matches!(session.next_tree(), Err(Error::Validation(_))));
        assert_eq!(session.forest().n_trees(), 0);
    }

    #[test]
    fn test_resume_keeps_scores() {
        let s = store();
        let targets = [0.0, 1.0, 3.0, 2.0];
        let base = GBDTTrainer::new(TrainingConfig {
            num_trees: 2,
            shrinkage: 0.5,
            ..config()
        })
        .train(&s, &targets, &[], None)
        .unwrap();
        let before = base.predict(&s).unwrap();

        let trainer = GBDTTrainer::new(TrainingConfig {
            num_trees: 2,
            shrinkage: 0.25,
            ..config()
        });
        let session = trainer.start(&s, &targets, &[], Some(&base)).unwrap();
        assert_eq!(session.forest().n_trees(), 2);
        for (a, b) in session.scores().iter().zip(before.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
        let resumed = trainer.train(&s, &targets, &[], Some(&base)).unwrap();
        assert_eq!(resumed.n_trees(), 4);
        assert_eq!(resumed.base_score(), base.base_score());
    }

    #[test]
    fn test_resume_appends_missing_features() {
        let mut s = store();
        s.add_string_column("c", ["a", "b", "a", "b"]).unwrap();
        let base_config = TrainingConfig {
            float_feature: vec![],
            categorical_feature: vec!["c".into()],
            ..config()
        };
        let targets = [0.0, 1.0, 0.0, 1.0];
        let base = GBDTTrainer::new(base_config).train(&s, &targets, &[], None).unwrap();
        let resumed = GBDTTrainer::new(config()).train(&s, &targets, &[], Some(&base)).unwrap();
        assert_eq!(resumed.config().categorical_feature, vec!["c".to_string()]);
        assert_eq!(resumed.features().get("c"), Some(1));

        let conflicting = GBDTTrainer::new(TrainingConfig {
            float_feature: vec!["x".into(), "c".into()],
            ..config()
        });
        assert!(matches!(
            conflicting.start(&s, &targets, &[], Some(&base)),
            Err(Error::Validation(_))
        ));
    }
}
