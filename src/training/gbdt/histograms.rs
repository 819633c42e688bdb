//! Per-node gradient histograms.
//!
//! A node histogram holds, for every sampled feature, one [`GradStat`] per
//! bin. Bin 0 is the missing bucket (float features) or the missing category
//! (categorical features).
//!
//! # Summation order
//!
//! Rows are cut into shards of [`SHARD_ROWS`] consecutive entries of the
//! node's row list. Work items are `(feature, shard)` pairs, so the pool can
//! spread both across features and across rows, and every feature is then
//! reduced shard by shard in ascending order. The shard size does not depend
//! on the thread count, so neither does any sum.

use crate::data::{BinIndex, BucketIndices};
use crate::training::{GradPair, Gradients};
use crate::utils::Parallelism;

use super::features::{FeatureBins, TrainingFeatures};

/// Rows per histogram work item.
pub const SHARD_ROWS: usize = 16 * 1024;

// =============================================================================
// GradStat
// =============================================================================

/// Gradient sum, hessian sum and row count of one bin or node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradStat {
    pub grad: f64,
    pub hess: f64,
    pub count: u32,
}

impl GradStat {
    /// Sum over `rows`, in row order.
    pub fn from_rows(rows: &[u32], gradients: &Gradients) -> Self {
        let (grad, hess) = gradients.sum(rows);
        Self {
            grad,
            hess,
            count: rows.len() as u32,
        }
    }

    #[inline]
    pub fn add_pair(&mut self, pair: GradPair) {
        self.grad += pair.grad;
        self.hess += pair.hess;
        self.count += 1;
    }

    #[inline]
    pub fn merge(&mut self, other: &GradStat) {
        self.grad += other.grad;
        self.hess += other.hess;
        self.count += other.count;
    }

    /// `self - other`; `other` must be a subset of `self`.
    #[inline]
    pub fn minus(&self, other: &GradStat) -> GradStat {
        GradStat {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
            count: self.count - other.count,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

// =============================================================================
// NodeHistogram
// =============================================================================

/// Bins of every sampled feature for one node.
///
/// Slot `i` belongs to the `i`-th entry of the sampled feature list the
/// histogram was built with.
#[derive(Debug, Clone)]
pub struct NodeHistogram {
    slots: Vec<Box<[GradStat]>>,
}

impl NodeHistogram {
    /// Accumulate `rows` for every feature in `sampled`.
    pub fn build(
        features: &TrainingFeatures<'_>,
        sampled: &[u32],
        rows: &[u32],
        gradients: &Gradients,
        parallelism: Parallelism,
    ) -> Self {
        let pairs = gradients.pairs();
        let n_shards = rows.len().div_ceil(SHARD_ROWS).max(1);

        let partials = parallelism.maybe_par_map(0..sampled.len() * n_shards, |item| {
            let slot = item / n_shards;
            let shard = item % n_shards;
            let start = shard * SHARD_ROWS;
            let end = (start + SHARD_ROWS).min(rows.len());
            let bins = features.feature(sampled[slot]);
            let mut out = vec![GradStat::default(); bins.n_bins()];
            accumulate_feature(bins, &rows[start..end], pairs, &mut out);
            out
        });

        let mut partials = partials.into_iter();
        let mut slots = Vec::with_capacity(sampled.len());
        for _ in 0..sampled.len() {
            let mut shards = partials.by_ref().take(n_shards);
            let mut acc = shards.next().unwrap_or_default();
            for shard in shards {
                for (a, s) in acc.iter_mut().zip(&shard) {
                    a.merge(s);
                }
            }
            slots.push(acc.into_boxed_slice());
        }
        Self { slots }
    }

    /// Histogram of the sibling of `child`, given that `self` is the parent.
    pub fn subtract(&self, child: &NodeHistogram) -> NodeHistogram {
        let slots = self
            .slots
            .iter()
            .zip(&child.slots)
            .map(|(parent, child)| parent.iter().zip(child.iter()).map(|(p, c)| p.minus(c)).collect())
            .collect();
        NodeHistogram { slots }
    }

    #[inline]
    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn slot(&self, slot: usize) -> &[GradStat] {
        &self.slots[slot]
    }
}

fn accumulate_feature(bins: &FeatureBins<'_>, rows: &[u32], pairs: &[GradPair], out: &mut [GradStat]) {
    match bins {
        FeatureBins::Float(column) => match column.indices() {
            BucketIndices::U8(v) => accumulate(v, rows, pairs, out),
            BucketIndices::U16(v) => accumulate(v, rows, pairs, out),
            BucketIndices::U32(v) => accumulate(v, rows, pairs, out),
        },
        FeatureBins::Categorical(column) => accumulate(column.codes(), rows, pairs, out),
    }
}

#[inline]
fn accumulate<B: BinIndex>(bins: &[B], rows: &[u32], pairs: &[GradPair], out: &mut [GradStat]) {
    for &row in rows {
        let row = row as usize;
        out[bins[row].index()].add_pair(pairs[row]);
    }
}
