//! Training configuration with builder pattern.
//!
//! [`TrainingConfig`] is the single record that drives a boosting run. It is
//! the same record that gets embedded in a serialized forest, so it derives
//! serde with snake_case keys and `#[serde(default)]`: a partial JSON document
//! fills the rest with defaults.
//!
//! # Example
//!
//! ```
//! use gbforest::training::{LossFunction, TrainingConfig};
//!
//! // All defaults
//! let config = TrainingConfig::builder().build().unwrap();
//! assert_eq!(config.num_trees, 100);
//!
//! let config = TrainingConfig::builder()
//!     .loss_func(LossFunction::Logloss)
//!     .num_trees(20)
//!     .shrinkage(0.05)
//!     .float_feature(vec!["age".into(), "income".into()])
//!     .categorical_feature(vec!["country".into()])
//!     .build()
//!     .unwrap();
//! assert_eq!(config.features().count(), 3);
//!
//! // Partial JSON
//! let config = TrainingConfig::from_json_str(r#"{"num_trees": 5, "loss_func": "gbrank"}"#).unwrap();
//! assert_eq!(config.loss_func, LossFunction::Gbrank);
//! assert_eq!(config.num_leaves, 32);
//! ```

use std::collections::HashSet;
use std::path::Path;

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::logger::Verbosity;
use super::objectives::LossFunction;
use crate::data::DEFAULT_NUM_BUCKETS;
use crate::error::{Error, Result};

// =============================================================================
// Enums
// =============================================================================

/// Search strategy for categorical splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalSplitStrategy {
    /// Order categories by `g / (h + lambda)` and scan prefixes of that order.
    #[default]
    SortByGradientRatio,
    /// Try every single category against all others.
    OneVsRest,
}

/// Tree growth policy derived from `num_leaves` and `max_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStrategy {
    /// Best-first: always expand the leaf with the largest gain.
    LeafWise { max_leaves: usize },
    /// Level by level up to `max_depth`, never exceeding `max_leaves`.
    DepthWise { max_depth: usize, max_leaves: usize },
}

// =============================================================================
// TrainingConfig
// =============================================================================

/// Configuration of one boosting run.
///
/// Build it with [`TrainingConfig::builder`] (validated on `build()`), parse it
/// from JSON with [`TrainingConfig::from_json_str`], or start from
/// [`TrainingConfig::default`] and edit fields directly. The trainer validates
/// again before starting, so all three routes end in the same checks.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct TrainingConfig {
    // === Objective ===
    /// Loss to minimize. Default: `mse`.
    #[builder(default)]
    pub loss_func: LossFunction,

    // === Boosting ===
    /// Number of trees to add. Default: 100.
    #[builder(default = 100)]
    pub num_trees: usize,

    /// Maximum leaves per tree. Default: 32.
    #[builder(default = 32)]
    pub num_leaves: usize,

    /// Optional depth bound. Switches growth to depth-wise.
    pub max_depth: Option<usize>,

    /// Learning rate applied to every leaf. Default: 0.1.
    #[builder(default = 0.1)]
    pub shrinkage: f64,

    /// Start from the loss's initial score instead of 0. Default: true.
    #[builder(default = true)]
    pub use_initial_score: bool,

    // === Regularization ===
    /// L2 penalty on leaf values (the `lambda` in `G^2 / (H + lambda)`).
    #[builder(default = 0.0)]
    pub l2_lambda: f64,

    /// Minimum gain a split must exceed.
    #[builder(default = 0.0)]
    pub min_gain: f64,

    /// Minimum number of sampled rows in each child.
    #[builder(default = 1)]
    pub min_rows_per_leaf: usize,

    /// Minimum hessian sum in each child.
    #[builder(default = 0.0)]
    pub min_hessian_per_leaf: f64,

    // === Sampling ===
    /// Fraction of rows used to grow each tree, in (0, 1].
    #[builder(default = 1.0)]
    pub example_sampling_rate: f64,

    /// Fraction of features considered for each tree, in (0, 1].
    #[builder(default = 1.0)]
    pub feature_sampling_rate: f64,

    /// Pair sampling rate for pairwise losses, in (0, 1].
    #[builder(default = 1.0)]
    pub pair_sampling_rate: f64,

    // === Pairwise losses ===
    /// Weight each pair by the target difference.
    #[builder(default = false)]
    pub pair_weight_by_delta_target: bool,

    /// Give every group the same total pair weight.
    #[builder(default = false)]
    pub equal_group_weight: bool,

    /// Log base of the LambdaMART rank discount. Must exceed 1.
    #[builder(default = 2.0)]
    pub lambdamart_dcg_base: f64,

    // === Splits ===
    #[builder(default)]
    pub categorical_split: CategoricalSplitStrategy,

    /// Number of buckets for raw float features bucketized at training time.
    #[builder(default = DEFAULT_NUM_BUCKETS)]
    pub num_buckets: usize,

    // === Features ===
    #[builder(default)]
    pub float_feature: Vec<String>,

    #[builder(default)]
    pub categorical_feature: Vec<String>,

    // === Target resolution ===
    pub target_column: Option<String>,
    pub weight_column: Option<String>,
    pub group_column: Option<String>,

    /// Map raw float targets to +1/-1 by `value > target_threshold`.
    #[builder(default = false)]
    pub binarize_target: bool,

    #[builder(default = 0.0)]
    pub target_threshold: f64,

    /// Categories of a string target that count as positive.
    #[builder(default)]
    pub positive_category: Vec<String>,

    // === Resources ===
    /// Base seed; iteration `i` uses `seed ^ i`.
    #[builder(default = 1234567)]
    pub seed: u64,

    /// Worker threads: 0 = all cores, 1 = sequential, n = exactly n.
    #[builder(default = 0)]
    pub num_threads: usize,

    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: training_config_builder::IsComplete> TrainingConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any parameter is invalid; see
    /// [`TrainingConfig::validate`].
    pub fn build(self) -> Result<TrainingConfig> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

impl TrainingConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every field against its allowed range.
    ///
    /// Rejects: `num_trees == 0`, `num_leaves < 2`, `max_depth == Some(0)`,
    /// non-positive or non-finite shrinkage, negative regularization, sampling
    /// rates outside (0, 1], `lambdamart_dcg_base <= 1` and duplicate feature
    /// names.
    pub fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(Error::validation("num_trees must be at least 1"));
        }
        if self.num_leaves < 2 {
            return Err(Error::validation(format!(
                "num_leaves must be at least 2, got {}",
                self.num_leaves
            )));
        }
        if self.max_depth == Some(0) {
            return Err(Error::validation("max_depth must be at least 1"));
        }
        if !(self.shrinkage.is_finite() && self.shrinkage > 0.0) {
            return Err(Error::validation(format!(
                "shrinkage must be positive and finite, got {}",
                self.shrinkage
            )));
        }
        for (field, value) in [
            ("l2_lambda", self.l2_lambda),
            ("min_gain", self.min_gain),
            ("min_hessian_per_leaf", self.min_hessian_per_leaf),
        ] {
            if !(value >= 0.0) {
                return Err(Error::validation(format!(
                    "{field} must be non-negative, got {value}"
                )));
            }
        }
        for (field, value) in [
            ("example_sampling_rate", self.example_sampling_rate),
            ("feature_sampling_rate", self.feature_sampling_rate),
            ("pair_sampling_rate", self.pair_sampling_rate),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::validation(format!("{field} must be in (0, 1], got {value}")));
            }
        }
        if !(self.lambdamart_dcg_base > 1.0) {
            return Err(Error::validation(format!(
                "lambdamart_dcg_base must be greater than 1, got {}",
                self.lambdamart_dcg_base
            )));
        }
        if self.num_buckets < 3 {
            return Err(Error::validation("num_buckets must be at least 3"));
        }

        let mut seen = HashSet::new();
        for name in self.features() {
            if !seen.insert(name) {
                return Err(Error::validation(format!("feature '{name}' is listed twice")));
            }
        }
        Ok(())
    }

    /// Features in canonical order: float features, then categorical ones.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.float_feature
            .iter()
            .chain(self.categorical_feature.iter())
            .map(String::as_str)
    }

    /// Growth policy implied by `num_leaves` and `max_depth`.
    pub fn growth_strategy(&self) -> GrowthStrategy {
        match self.max_depth {
            Some(max_depth) => GrowthStrategy::DepthWise {
                max_depth,
                max_leaves: self.num_leaves,
            },
            None => GrowthStrategy::LeafWise {
                max_leaves: self.num_leaves,
            },
        }
    }
}
