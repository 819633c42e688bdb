//! Gradient Boosted Decision Tree (GBDT) training module.
//!
//! This module contains all components specific to tree-based gradient boosting:
//!
//! - [`features`] - Integer-coded training view of the feature columns
//! - [`histograms`] - Per-node gradient histograms and the subtraction trick
//! - [`split`] - Gain computation and split finding
//! - [`partition`] - Row index partitioning for tree nodes
//! - [`grower`] - Leaf-wise and depth-wise tree growing
//! - [`trainer`] - GBDT training loop

pub mod features;
pub mod grower;
pub mod histograms;
pub mod partition;
pub mod split;
pub mod trainer;

pub use features::{FeatureBins, TrainingFeatures};
pub use grower::{GrownTree, TreeGrower};
pub use histograms::{GradStat, NodeHistogram, SHARD_ROWS};
pub use partition::RowPartitioner;
pub use split::{GainParams, RowRouter, SplitFinder, SplitInfo, SplitRule, MIN_SPLIT_GAIN};
pub use trainer::{BoostingSession, GBDTTrainer, IterationReport};
