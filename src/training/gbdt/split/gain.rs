//! Gain computation and regularization parameters.

use crate::training::TrainingConfig;
use crate::training::gbdt::histograms::GradStat;

/// Floor under the configured minimum gain; splits must beat it strictly.
pub const MIN_SPLIT_GAIN: f64 = 1e-6;

// =============================================================================
// Gain Parameters
// =============================================================================

/// Parameters for split gain computation and leaf weight calculation.
///
/// Static for the lifetime of one training call.
#[derive(Clone, Debug, PartialEq)]
pub struct GainParams {
    /// L2 regularization (lambda).
    pub l2_lambda: f64,
    /// Minimum split gain.
    pub min_gain: f64,
    /// Minimum rows per child.
    pub min_rows_per_leaf: u32,
    /// Minimum sum of hessians per child.
    pub min_hessian_per_leaf: f64,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            l2_lambda: 0.0,
            min_gain: 0.0,
            min_rows_per_leaf: 1,
            min_hessian_per_leaf: 0.0,
        }
    }
}

impl GainParams {
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            l2_lambda: config.l2_lambda,
            min_gain: config.min_gain,
            min_rows_per_leaf: config.min_rows_per_leaf.max(1) as u32,
            min_hessian_per_leaf: config.min_hessian_per_leaf,
        }
    }

    /// Node score `G² / (H + λ)`, 0 when the denominator vanishes.
    #[inline]
    pub fn score(&self, grad: f64, hess: f64) -> f64 {
        let denom = hess + self.l2_lambda;
        if denom <= 0.0 {
            0.0
        } else {
            grad * grad / denom
        }
    }

    /// Compute the split gain.
    ///
    /// ```text
    /// gain = G_L²/(H_L + λ) + G_R²/(H_R + λ) - G_P²/(H_P + λ)
    /// ```
    #[inline]
    pub fn gain(&self, left: &GradStat, right: &GradStat, parent: &GradStat) -> f64 {
        self.score(left.grad, left.hess) + self.score(right.grad, right.hess) - self.score(parent.grad, parent.hess)
    }

    /// Lowest gain a split has to exceed.
    #[inline]
    pub fn min_accepted_gain(&self) -> f64 {
        self.min_gain.max(MIN_SPLIT_GAIN)
    }

    /// Check if both children satisfy the row and hessian minimums.
    #[inline]
    pub fn is_valid_split(&self, left: &GradStat, right: &GradStat) -> bool {
        left.count >= self.min_rows_per_leaf
            && right.count >= self.min_rows_per_leaf
            && left.hess >= self.min_hessian_per_leaf
            && right.hess >= self.min_hessian_per_leaf
    }

    /// Whether a node is large enough for any split to pass the row minimum.
    #[inline]
    pub fn can_split(&self, node: &GradStat) -> bool {
        node.count >= 2 * self.min_rows_per_leaf
    }

    /// Leaf value `-G / (H + λ)`, 0 when the denominator vanishes.
    #[inline]
    pub fn leaf_value(&self, grad: f64, hess: f64) -> f64 {
        let denom = hess + self.l2_lambda;
        if denom <= 0.0 {
            0.0
        } else {
            -grad / denom
        }
    }
}
