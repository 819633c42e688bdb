//! Training infrastructure for gradient boosting.
//!
//! This module provides the core types needed for training:
//!
//! - [`TrainingConfig`]: Everything a boosting run needs, serde and builder friendly
//! - [`Objective`]: A loss bound to targets and groups, producing gradients
//! - [`Gradients`]: Per-row gradient and hessian buffer
//! - [`GBDTTrainer`] / [`BoostingSession`]: The boosting loop, one tree per step
//! - [`TrainingLogger`]: Structured logging with verbosity levels
//!
//! ## Loss Functions
//!
//! - `mse`: Squared error for regression
//! - `logloss`: Binary log loss
//! - `huberized_hinge`: Smoothed hinge for binary classification
//! - `auc`, `pairwise_logloss`, `gbrank`: Pairwise ranking losses
//! - `lambdamart`: Rank-discount weighted pairwise loss

mod config;
pub mod gbdt;
mod gradients;
mod logger;
pub mod objectives;
pub mod sampling;
mod target;

pub use config::{CategoricalSplitStrategy, GrowthStrategy, TrainingConfig};
pub use gbdt::{BoostingSession, GBDTTrainer, IterationReport};
pub use gradients::{GradPair, Gradients};
pub use logger::{TrainingLogger, Verbosity};
pub use objectives::{LossFunction, LossSummary, Objective};
pub use target::{resolve_targets, resolve_weights, Groups};
