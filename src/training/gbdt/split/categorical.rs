//! Categorical split search.
//!
//! Only non-empty categories take part; the missing category (code 0) is an
//! ordinary category here. The chosen left set is kept in scan order, which
//! is also the order the categories are persisted in.

use std::cmp::Ordering;

use crate::training::CategoricalSplitStrategy;
use crate::training::gbdt::histograms::GradStat;

use super::gain::GainParams;

/// Best partition of one categorical feature's bins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoricalCandidate {
    pub gain: f64,
    pub left: GradStat,
    pub right: GradStat,
    pub left_codes: Vec<u32>,
}

pub(crate) fn find_categorical_split(
    params: &GainParams,
    strategy: CategoricalSplitStrategy,
    bins: &[GradStat],
    parent: &GradStat,
) -> Option<CategoricalCandidate> {
    let nonempty: Vec<u32> = (0..bins.len() as u32).filter(|&c| !bins[c as usize].is_empty()).collect();
    if nonempty.len() < 2 {
        return None;
    }
    match strategy {
        CategoricalSplitStrategy::SortByGradientRatio => sort_and_scan(params, bins, parent, nonempty),
        CategoricalSplitStrategy::OneVsRest => one_vs_rest(params, bins, parent, &nonempty),
    }
}

fn sort_and_scan(
    params: &GainParams,
    bins: &[GradStat],
    parent: &GradStat,
    mut order: Vec<u32>,
) -> Option<CategoricalCandidate> {
    let ratio = |code: u32| {
        let b = &bins[code as usize];
        let r = b.grad / (b.hess + params.l2_lambda);
        if r.is_nan() {
            0.0
        } else {
            r
        }
    };
    order.sort_by(|&a, &b| {
        ratio(a)
            .partial_cmp(&ratio(b))
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut best_gain = params.min_accepted_gain();
    let mut best: Option<(usize, GradStat, GradStat)> = None;
    let mut acc = GradStat::default();
    for k in 1..order.len() {
        acc.merge(&bins[order[k - 1] as usize]);
        let right = parent.minus(&acc);
        if !params.is_valid_split(&acc, &right) {
            continue;
        }
        let gain = params.gain(&acc, &right, parent);
        if gain > best_gain {
            best_gain = gain;
            best = Some((k, acc, right));
        }
    }

    let (k, prefix, suffix) = best?;
    // The smaller side becomes the listed (left) set.
    let candidate = if k * 2 <= order.len() {
        CategoricalCandidate {
            gain: best_gain,
            left: prefix,
            right: suffix,
            left_codes: order[..k].to_vec(),
        }
    } else {
        CategoricalCandidate {
            gain: best_gain,
            left: suffix,
            right: prefix,
            left_codes: order[k..].to_vec(),
        }
    };
    Some(candidate)
}

fn one_vs_rest(
    params: &GainParams,
    bins: &[GradStat],
    parent: &GradStat,
    nonempty: &[u32],
) -> Option<CategoricalCandidate> {
    let mut best_gain = params.min_accepted_gain();
    let mut best = None;
    for &code in nonempty {
        let left = bins[code as usize];
        let right = parent.minus(&left);
        if !params.is_valid_split(&left, &right) {
            continue;
        }
        let gain = params.gain(&left, &right, parent);
        if gain > best_gain {
            best_gain = gain;
            best = Some(CategoricalCandidate {
                gain,
                left,
                right,
                left_codes: vec![code],
            });
        }
    }
    best
}
