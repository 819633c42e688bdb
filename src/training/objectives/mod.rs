//! Loss functions for gradient boosting.
//!
//! The set of losses is closed: [`LossFunction`] names them in the config and
//! [`Objective`] binds one to the training data (groups, targets) and
//! dispatches gradient computation.
//!
//! # Conventions
//!
//! `grad = dL/df` and `hess = d2L/df2`, both multiplied by the row weight. For
//! pairwise losses the per-pair derivatives are taken with respect to the
//! score difference and scattered onto both rows of the pair.
//!
//! # Available Losses
//!
//! ## Pointwise
//! - `mse`: squared error
//! - `logloss`: binary log loss, targets in {-1, +1}
//! - `huberized_hinge`: smoothed hinge, targets in {-1, +1}
//!
//! ## Pairwise
//! - `auc`: huberized hinge on score differences
//! - `pairwise_logloss`: log loss on score differences
//! - `gbrank`: squared hinge against target differences
//! - `lambdamart`: log loss weighted by rank-discount changes

mod pairwise;
mod pointwise;

pub use pairwise::{PairLoss, PairwiseLoss};
pub use pointwise::PointwiseLoss;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::training::config::TrainingConfig;
use crate::training::gradients::Gradients;
use crate::training::target::Groups;
use crate::utils::Parallelism;

// =============================================================================
// LossFunction
// =============================================================================

/// Loss identifier as written in configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    #[default]
    Mse,
    Logloss,
    HuberizedHinge,
    Auc,
    PairwiseLogloss,
    Gbrank,
    Lambdamart,
}

impl LossFunction {
    /// Whether gradients come from sampled pairs within groups.
    #[inline]
    pub fn is_pairwise(self) -> bool {
        matches!(
            self,
            Self::Auc | Self::PairwiseLogloss | Self::Gbrank | Self::Lambdamart
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::Logloss => "logloss",
            Self::HuberizedHinge => "huberized_hinge",
            Self::Auc => "auc",
            Self::PairwiseLogloss => "pairwise_logloss",
            Self::Gbrank => "gbrank",
            Self::Lambdamart => "lambdamart",
        }
    }
}

impl std::fmt::Display for LossFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// LossSummary
// =============================================================================

/// Weighted loss accumulated while computing gradients.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LossSummary {
    pub loss: f64,
    pub weight_sum: f64,
}

impl LossSummary {
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            loss: self.loss + other.loss,
            weight_sum: self.weight_sum + other.weight_sum,
        }
    }

    /// Weighted mean loss, 0 when nothing was weighed.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.weight_sum > 0.0 {
            self.loss / self.weight_sum
        } else {
            0.0
        }
    }
}

// =============================================================================
// Objective
// =============================================================================

/// A loss bound to the data it trains on.
#[derive(Debug, Clone)]
pub enum Objective {
    Pointwise(PointwiseLoss),
    Pairwise(PairwiseLoss),
}

impl Objective {
    /// Bind the configured loss to targets and groups.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the targets are not valid for the loss.
    pub fn new(config: &TrainingConfig, targets: &[f64], groups: &Groups) -> Result<Self> {
        let pointwise = match config.loss_func {
            LossFunction::Mse => Some(PointwiseLoss::Mse),
            LossFunction::Logloss => Some(PointwiseLoss::Logloss),
            LossFunction::HuberizedHinge => Some(PointwiseLoss::HuberizedHinge),
            _ => None,
        };
        if let Some(loss) = pointwise {
            loss.validate_targets(targets)?;
            return Ok(Self::Pointwise(loss));
        }

        if let Some(row) = targets.iter().position(|y| !y.is_finite()) {
            return Err(Error::validation(format!("target of row {row} is not finite")));
        }
        let pair_loss = match config.loss_func {
            LossFunction::Auc => PairLoss::Auc,
            LossFunction::PairwiseLogloss => PairLoss::Logloss,
            LossFunction::Gbrank => PairLoss::Gbrank,
            _ => PairLoss::Lambdamart,
        };
        Ok(Self::Pairwise(PairwiseLoss::new(pair_loss, groups, targets, config)))
    }

    /// Best constant score before any tree. Pairwise losses are shift-invariant
    /// and start at 0.
    pub fn initial_score(&self, targets: &[f64], weights: &[f64]) -> f64 {
        match self {
            Self::Pointwise(loss) => loss.initial_score(targets, weights),
            Self::Pairwise(_) => 0.0,
        }
    }

    /// Fill `grads` for every row from the current scores.
    pub fn compute_gradients(
        &self,
        scores: &[f64],
        targets: &[f64],
        weights: &[f64],
        iteration_seed: u64,
        grads: &mut Gradients,
        parallelism: Parallelism,
    ) -> LossSummary {
        match self {
            Self::Pointwise(loss) => loss.compute(scores, targets, weights, grads, parallelism),
            Self::Pairwise(loss) => {
                loss.compute(scores, targets, weights, iteration_seed, grads, parallelism)
            }
        }
    }
}
