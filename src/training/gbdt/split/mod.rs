//! Split finding for tree growing.
//!
//! - [`gain`]: gain formula, leaf values and split constraints
//! - [`categorical`]: sort-and-scan and one-vs-rest partitions
//!
//! Every sampled feature is searched independently (in parallel when
//! allowed) and the per-feature winners are then compared in canonical
//! feature order. A later feature replaces the current best only with a
//! strictly larger gain, so ties go to the feature listed first.

mod categorical;
pub mod gain;

pub use gain::{GainParams, MIN_SPLIT_GAIN};

use crate::data::{BucketBoundaries, MISSING_BUCKET};
use crate::inference::CodeSet;
use crate::training::CategoricalSplitStrategy;
use crate::utils::Parallelism;

use super::features::{FeatureBins, TrainingFeatures};
use super::histograms::{GradStat, NodeHistogram};

use categorical::find_categorical_split;

// =============================================================================
// SplitInfo
// =============================================================================

/// How rows are routed by a chosen split, in training terms.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule {
    /// Buckets `1..=split_bin` go left; the missing bucket follows the flag.
    Float {
        split_bin: u32,
        threshold: f64,
        missing_to_right: bool,
    },
    /// Listed dictionary codes go left, in scan order.
    Categorical { left_codes: Vec<u32> },
}

/// Best split of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    /// Canonical feature index.
    pub feature: u32,
    pub gain: f64,
    pub left: GradStat,
    pub right: GradStat,
    pub rule: SplitRule,
}

/// [`SplitRule`] compiled for partitioning rows.
#[derive(Debug, Clone)]
pub enum RowRouter {
    Float { split_bin: u32, missing_to_right: bool },
    Categorical(CodeSet),
}

impl RowRouter {
    pub fn new(rule: &SplitRule) -> Self {
        match rule {
            SplitRule::Float {
                split_bin,
                missing_to_right,
                ..
            } => Self::Float {
                split_bin: *split_bin,
                missing_to_right: *missing_to_right,
            },
            SplitRule::Categorical { left_codes } => Self::Categorical(CodeSet::from_codes(left_codes.iter().copied())),
        }
    }

    #[inline]
    pub fn goes_left(&self, bins: &FeatureBins<'_>, row: usize) -> bool {
        let bin = bins.bin(row);
        match self {
            Self::Float {
                split_bin,
                missing_to_right,
            } => {
                if bin == MISSING_BUCKET {
                    !missing_to_right
                } else {
                    bin <= *split_bin
                }
            }
            Self::Categorical(set) => set.contains(bin),
        }
    }
}

// =============================================================================
// SplitFinder
// =============================================================================

#[derive(Debug, Clone)]
pub struct SplitFinder {
    params: GainParams,
    categorical: CategoricalSplitStrategy,
}

impl SplitFinder {
    pub fn new(params: GainParams, categorical: CategoricalSplitStrategy) -> Self {
        Self { params, categorical }
    }

    #[inline]
    pub fn params(&self) -> &GainParams {
        &self.params
    }

    /// Best split over the sampled features, `None` when no candidate passes.
    pub fn find_best(
        &self,
        features: &TrainingFeatures<'_>,
        sampled: &[u32],
        histogram: &NodeHistogram,
        parent: &GradStat,
        parallelism: Parallelism,
    ) -> Option<SplitInfo> {
        if !self.params.can_split(parent) {
            return None;
        }
        let per_feature = parallelism.maybe_par_map(0..sampled.len(), |slot| {
            let feature = sampled[slot];
            let bins = histogram.slot(slot);
            match features.feature(feature) {
                FeatureBins::Float(column) => self.find_numeric(feature, bins, column.boundaries(), parent),
                FeatureBins::Categorical(_) => {
                    find_categorical_split(&self.params, self.categorical, bins, parent).map(|c| SplitInfo {
                        feature,
                        gain: c.gain,
                        left: c.left,
                        right: c.right,
                        rule: SplitRule::Categorical {
                            left_codes: c.left_codes,
                        },
                    })
                }
            }
        });

        // `sampled` is ascending, so slot order is canonical feature order.
        let mut best: Option<SplitInfo> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.as_ref().map_or(true, |b| candidate.gain > b.gain) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Scan non-missing buckets left to right, trying the missing bucket on
    /// both sides of every cut.
    ///
    /// The missing bucket comes first in scan order, so the cut separating
    /// missing rows from all present rows is tried before any value cut.
    fn find_numeric(
        &self,
        feature: u32,
        bins: &[GradStat],
        boundaries: &BucketBoundaries,
        parent: &GradStat,
    ) -> Option<SplitInfo> {
        let missing = bins[MISSING_BUCKET as usize];
        let nonempty: Vec<u32> = (1..bins.len() as u32).filter(|&b| !bins[b as usize].is_empty()).collect();
        let &first = nonempty.first()?;

        let mut best_gain = self.params.min_accepted_gain();
        let mut best: Option<SplitInfo> = None;
        if !missing.is_empty() {
            let right = parent.minus(&missing);
            if self.params.is_valid_split(&missing, &right) {
                let gain = self.params.gain(&missing, &right, parent);
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(SplitInfo {
                        feature,
                        gain,
                        left: missing,
                        right,
                        // Every present value is at least the first bucket's minimum.
                        rule: SplitRule::Float {
                            split_bin: MISSING_BUCKET,
                            threshold: boundaries.bucket_min(first),
                            missing_to_right: false,
                        },
                    });
                }
            }
        }

        let mut acc = GradStat::default();
        for window in nonempty.windows(2) {
            let (bucket, next) = (window[0], window[1]);
            acc.merge(&bins[bucket as usize]);
            for missing_to_right in [false, true] {
                let mut left = acc;
                if !missing_to_right {
                    left.merge(&missing);
                }
                let right = parent.minus(&left);
                if !self.params.is_valid_split(&left, &right) {
                    continue;
                }
                let gain = self.params.gain(&left, &right, parent);
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(SplitInfo {
                        feature,
                        gain,
                        left,
                        right,
                        rule: SplitRule::Float {
                            split_bin: bucket,
                            threshold: threshold_between(boundaries, bucket, next),
                            missing_to_right,
                        },
                    });
                }
            }
        }
        best
    }
}

/// Midpoint between the largest value of `bucket` and the smallest of
/// `next`, nudged up to `next`'s minimum if rounding lands on the left max.
fn threshold_between(boundaries: &BucketBoundaries, bucket: u32, next: u32) -> f64 {
    let upper = boundaries.bucket_max(bucket);
    let lower = boundaries.bucket_min(next);
    let mid = 0.5 * upper + 0.5 * lower;
    if mid > upper {
        mid
    } else {
        lower
    }
}
