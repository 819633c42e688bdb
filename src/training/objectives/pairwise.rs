//! Pairwise ranking losses.
//!
//! Pairs are formed inside query groups between rows with different targets.
//! Each group is sorted by descending target and cut into blocks of equal
//! target; a block pairs with every row after it:
//!
//! ```text
//! sorted targets:  3 3 | 2 | 1 1 1
//! block 0 (len 2): pairs with the 4 rows after it -> 8 pairs
//! block 1 (len 1): pairs with the 3 rows after it -> 3 pairs
//! block 2 (len 3): nothing after it               -> 0 pairs
//! ```
//!
//! Pairs are sampled uniformly with replacement. Each group owns an RNG seeded
//! from the iteration seed and the group index, and contributions are added to
//! the gradient buffer in group order, so results do not depend on threads.

use rand::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::pointwise::{huberized_hinge, logloss};
use super::LossSummary;
use crate::training::config::TrainingConfig;
use crate::training::gradients::Gradients;
use crate::training::target::Groups;
use crate::utils::Parallelism;

/// Loss applied to the score difference of a (positive, negative) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairLoss {
    /// Huberized hinge on the score difference.
    Auc,
    /// Logistic loss on the score difference.
    Logloss,
    /// Squared hinge against the target difference.
    Gbrank,
    /// Logistic loss weighted by the change in rank discount.
    Lambdamart,
}

impl PairLoss {
    /// Loss, gradient and hessian with respect to `df = f_pos - f_neg`.
    #[inline]
    pub fn eval(self, df: f64, dy: f64) -> (f64, f64, f64) {
        match self {
            Self::Auc => huberized_hinge(1.0, df),
            Self::Logloss | Self::Lambdamart => logloss(1.0, df),
            Self::Gbrank => {
                let m = dy - df;
                if m > 0.0 {
                    (m * m, -2.0 * m, 2.0)
                } else {
                    (0.0, 0.0, 0.0)
                }
            }
        }
    }
}

/// One group's rows ordered for pair sampling.
#[derive(Debug, Clone)]
struct RankedGroup {
    /// Rows sorted by descending target, ties in store order.
    rows: Vec<u32>,
    /// `(start, len)` of each block of equal targets that has rows after it.
    blocks: Vec<(usize, usize)>,
    /// Exclusive prefix sums of pair counts per block.
    offsets: Vec<u64>,
    n_pairs: u64,
}

impl RankedGroup {
    fn new(rows: &[u32], targets: &[f64]) -> Self {
        let mut rows = rows.to_vec();
        rows.sort_by(|&a, &b| targets[b as usize].total_cmp(&targets[a as usize]).then(a.cmp(&b)));

        let n = rows.len();
        let mut blocks = Vec::new();
        let mut offsets = Vec::new();
        let mut n_pairs = 0u64;
        let mut start = 0;
        while start < n {
            let value = targets[rows[start] as usize];
            let mut end = start + 1;
            while end < n && targets[rows[end] as usize] == value {
                end += 1;
            }
            if end < n {
                blocks.push((start, end - start));
                offsets.push(n_pairs);
                n_pairs += ((end - start) * (n - end)) as u64;
            }
            start = end;
        }
        Self {
            rows,
            blocks,
            offsets,
            n_pairs,
        }
    }

    /// Sorted positions `(pos, neg)` of the `index`-th pair.
    #[inline]
    fn pair(&self, index: u64) -> (usize, usize) {
        let b = self.offsets.partition_point(|&o| o <= index) - 1;
        let (start, len) = self.blocks[b];
        let local = (index - self.offsets[b]) as usize;
        (start + local % len, start + len + local / len)
    }
}

/// Pairwise objective bound to the training groups.
#[derive(Debug, Clone)]
pub struct PairwiseLoss {
    loss: PairLoss,
    groups: Vec<RankedGroup>,
    probability: f64,
    max_pairs: u64,
    weight_by_delta_target: bool,
    equal_group_weight: bool,
    dcg_base: f64,
}

impl PairwiseLoss {
    pub fn new(loss: PairLoss, groups: &Groups, targets: &[f64], config: &TrainingConfig) -> Self {
        let ranked: Vec<RankedGroup> = groups.iter().map(|rows| RankedGroup::new(rows, targets)).collect();
        let total_pairs: u64 = ranked.iter().map(|g| g.n_pairs).sum();
        let max_pairs = ranked.iter().map(|g| g.n_pairs).max().unwrap_or(0);
        let n_rows: usize = ranked.iter().map(|g| g.rows.len()).sum();
        let probability = if total_pairs == 0 {
            0.0
        } else {
            config.pair_sampling_rate * n_rows as f64 / total_pairs as f64 / 2.0
        };
        Self {
            loss,
            groups: ranked,
            probability,
            max_pairs,
            weight_by_delta_target: config.pair_weight_by_delta_target,
            equal_group_weight: config.equal_group_weight,
            dcg_base: config.lambdamart_dcg_base,
        }
    }

    /// Number of pairs sampled from a group per iteration.
    #[inline]
    fn draws(&self, group: &RankedGroup) -> u64 {
        (group.n_pairs as f64 * self.probability).floor() as u64
    }

    /// Total pairs available over all groups.
    pub fn total_pairs(&self) -> u64 {
        self.groups.iter().map(|g| g.n_pairs).sum()
    }

    #[inline]
    fn discount(&self, rank: usize) -> f64 {
        self.dcg_base.ln() / (self.dcg_base + rank as f64).ln()
    }

    /// Sample pairs and fill `grads` for every row.
    pub fn compute(
        &self,
        scores: &[f64],
        targets: &[f64],
        weights: &[f64],
        iteration_seed: u64,
        grads: &mut Gradients,
        parallelism: Parallelism,
    ) -> LossSummary {
        let contributions = parallelism.maybe_par_map(0..self.groups.len(), |g| {
            self.group_contributions(g, scores, targets, weights, iteration_seed)
        });

        grads.reset();
        let mut summary = LossSummary::default();
        for (entries, partial) in contributions {
            for (row, g, h) in entries {
                grads.add(row as usize, g, h);
            }
            summary = summary.merge(partial);
        }
        summary
    }

    fn group_contributions(
        &self,
        g: usize,
        scores: &[f64],
        targets: &[f64],
        weights: &[f64],
        iteration_seed: u64,
    ) -> (Vec<(u32, f64, f64)>, LossSummary) {
        let group = &self.groups[g];
        let draws = self.draws(group);
        let mut summary = LossSummary::default();
        if draws == 0 {
            return (Vec::new(), summary);
        }

        // Current rank of each sorted position, by descending score.
        let ranks = (self.loss == PairLoss::Lambdamart).then(|| {
            let mut order: Vec<usize> = (0..group.rows.len()).collect();
            order.sort_by(|&a, &b| {
                let (ra, rb) = (group.rows[a] as usize, group.rows[b] as usize);
                scores[rb].total_cmp(&scores[ra]).then(ra.cmp(&rb))
            });
            let mut ranks = vec![0usize; order.len()];
            for (rank, &pos) in order.iter().enumerate() {
                ranks[pos] = rank;
            }
            ranks
        });

        let rescale = if self.equal_group_weight {
            self.max_pairs as f64 / group.n_pairs as f64
        } else {
            1.0
        };

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(group_seed(iteration_seed, g));
        let mut entries = Vec::with_capacity(2 * draws as usize);
        for _ in 0..draws {
            let (pos, neg) = group.pair(rng.gen_range(0..group.n_pairs));
            let (rp, rn) = (group.rows[pos], group.rows[neg]);
            let (ip, in_) = (rp as usize, rn as usize);
            let dy = targets[ip] - targets[in_];
            let df = scores[ip] - scores[in_];

            let weighting = match &ranks {
                Some(ranks) => dy * (self.discount(ranks[pos]) - self.discount(ranks[neg])).abs(),
                None if self.weight_by_delta_target => dy,
                None => 1.0,
            };
            let w = weights[ip] * weights[in_] * weighting * rescale;

            let (l, pg, ph) = self.loss.eval(df, dy);
            entries.push((rp, w * pg, 2.0 * w * ph));
            entries.push((rn, -w * pg, 2.0 * w * ph));
            summary.loss += w * l;
            summary.weight_sum += w;
        }
        (entries, summary)
    }
}

/// Seed of a group's RNG for one iteration.
#[inline]
fn group_seed(iteration_seed: u64, group: usize) -> u64 {
    iteration_seed ^ (group as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
