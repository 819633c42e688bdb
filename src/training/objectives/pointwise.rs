//! Pointwise losses: each row's gradient depends only on its own score.

use rayon::prelude::*;

use super::LossSummary;
use crate::error::{Error, Result};
use crate::training::gradients::{GradPair, Gradients};
use crate::utils::Parallelism;

/// Rows per work item when computing gradients.
const ROW_CHUNK: usize = 16 * 1024;

/// Bounds for the positive fraction behind the logloss initial score.
const MIN_PROBABILITY: f64 = 1e-12;

/// Losses whose gradient at a row depends only on that row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointwiseLoss {
    /// `L = (y - f)^2 / 2`.
    Mse,
    /// `L = ln(1 + exp(-y f))` with `y` in {-1, +1}.
    Logloss,
    /// Squared hinge up to margin 0, linear below.
    HuberizedHinge,
}

impl PointwiseLoss {
    /// Loss, gradient and hessian at one point, unweighted.
    #[inline]
    pub fn eval(self, y: f64, f: f64) -> (f64, f64, f64) {
        match self {
            Self::Mse => mse(y, f),
            Self::Logloss => logloss(y, f),
            Self::HuberizedHinge => huberized_hinge(y, f),
        }
    }

    /// Reject targets the loss is undefined for.
    pub fn validate_targets(self, targets: &[f64]) -> Result<()> {
        if let Some(row) = targets.iter().position(|y| !y.is_finite()) {
            return Err(Error::validation(format!("target of row {row} is not finite")));
        }
        if matches!(self, Self::Logloss | Self::HuberizedHinge) {
            if let Some(row) = targets.iter().position(|&y| y != 1.0 && y != -1.0) {
                return Err(Error::validation(format!(
                    "binary losses need targets in {{-1, +1}}, row {row} has {}",
                    targets[row]
                )));
            }
        }
        Ok(())
    }

    /// Best constant score before any tree.
    pub fn initial_score(self, targets: &[f64], weights: &[f64]) -> f64 {
        let weight_sum: f64 = weights.iter().sum();
        if weight_sum <= 0.0 {
            return 0.0;
        }
        match self {
            Self::Mse => {
                let total: f64 = targets.iter().zip(weights).map(|(y, w)| y * w).sum();
                total / weight_sum
            }
            Self::Logloss => {
                let positive: f64 = targets
                    .iter()
                    .zip(weights)
                    .filter(|(&y, _)| y > 0.0)
                    .map(|(_, w)| w)
                    .sum();
                let p = (positive / weight_sum).clamp(MIN_PROBABILITY, 1.0 - MIN_PROBABILITY);
                (p / (1.0 - p)).ln()
            }
            Self::HuberizedHinge => 0.0,
        }
    }

    /// Fill `grads` for every row and return the weighted loss.
    ///
    /// Rows are processed in fixed-size chunks whose partial sums are added in
    /// chunk order, so the summary does not depend on the thread count.
    pub fn compute(
        self,
        scores: &[f64],
        targets: &[f64],
        weights: &[f64],
        grads: &mut Gradients,
        parallelism: Parallelism,
    ) -> LossSummary {
        let pairs = grads.pairs_mut();
        let work = |(start, chunk): (usize, &mut [GradPair])| -> LossSummary {
            let mut summary = LossSummary::default();
            for (i, pair) in chunk.iter_mut().enumerate() {
                let row = start + i;
                let w = weights[row];
                let (l, g, h) = self.eval(targets[row], scores[row]);
                *pair = GradPair::new(w * g, w * h);
                summary.loss += w * l;
                summary.weight_sum += w;
            }
            summary
        };

        let partials: Vec<LossSummary> = if parallelism.is_parallel() {
            pairs
                .par_chunks_mut(ROW_CHUNK)
                .enumerate()
                .map(|(c, chunk)| work((c * ROW_CHUNK, chunk)))
                .collect()
        } else {
            pairs
                .chunks_mut(ROW_CHUNK)
                .enumerate()
                .map(|(c, chunk)| work((c * ROW_CHUNK, chunk)))
                .collect()
        };
        partials.into_iter().fold(LossSummary::default(), LossSummary::merge)
    }
}

#[inline]
pub(crate) fn mse(y: f64, f: f64) -> (f64, f64, f64) {
    let d = f - y;
    (0.5 * d * d, d, 1.0)
}

#[inline]
pub(crate) fn logloss(y: f64, f: f64) -> (f64, f64, f64) {
    let margin = y * f;
    let p = 1.0 / (1.0 + margin.exp());
    // ln(1 + exp(-m)), stable for large |m|.
    let loss = if margin > 0.0 {
        (-margin).exp().ln_1p()
    } else {
        -margin + margin.exp().ln_1p()
    };
    (loss, -y * p, p * (1.0 - p))
}

#[inline]
pub(crate) fn huberized_hinge(y: f64, f: f64) -> (f64, f64, f64) {
    let e = y * f;
    if e >= 1.0 {
        (0.0, 0.0, 0.0)
    } else if e >= 0.0 {
        let m = 1.0 - e;
        (0.5 * m * m, -m * y, 1.0)
    } else {
        (0.5 - e, -y, 0.0)
    }
}
