//! Row and feature sampling for one boosting iteration.
//!
//! Both draws come from the iteration's RNG (rows first, then features), so a
//! fixed seed reproduces the same subsets regardless of the thread count.
//!
//! # Example
//!
//! ```
//! use gbforest::training::sampling::sample_rows;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
//! let rows = sample_rows(&mut rng, 10, 0.5).unwrap();
//! assert_eq!(rows.len(), 5);
//! assert!(rows.windows(2).all(|w| w[0] < w[1]));
//! ```

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::error::{Error, Result};

/// Draw `round(rate * n_rows)` distinct rows, sorted ascending.
///
/// # Errors
///
/// [`Error::Validation`] when the rate selects no rows.
pub fn sample_rows(rng: &mut Xoshiro256PlusPlus, n_rows: usize, rate: f64) -> Result<Vec<u32>> {
    let k = sample_size(n_rows, rate);
    if k == 0 {
        return Err(Error::validation(format!(
            "example_sampling_rate {rate} selects no rows out of {n_rows}"
        )));
    }
    Ok(sample_without_replacement(rng, n_rows, k))
}

/// Draw `round(rate * n_features)` distinct feature indices, sorted ascending.
///
/// # Errors
///
/// [`Error::Validation`] when the rate selects no features.
pub fn sample_features(rng: &mut Xoshiro256PlusPlus, n_features: usize, rate: f64) -> Result<Vec<u32>> {
    let k = sample_size(n_features, rate);
    if k == 0 {
        return Err(Error::validation(format!(
            "feature_sampling_rate {rate} selects no features out of {n_features}"
        )));
    }
    Ok(sample_without_replacement(rng, n_features, k))
}

#[inline]
fn sample_size(n: usize, rate: f64) -> usize {
    if rate >= 1.0 {
        n
    } else {
        ((rate * n as f64).round() as usize).min(n)
    }
}

/// Partial Fisher-Yates shuffle of `0..n`, keeping the first `k`, sorted.
fn sample_without_replacement(rng: &mut Xoshiro256PlusPlus, n: usize, k: usize) -> Vec<u32> {
    let mut all: Vec<u32> = (0..n as u32).collect();
    if k < n {
        for i in 0..k {
            let j = rng.gen_range(i..n);
            all.swap(i, j);
        }
        all.truncate(k);
        all.sort_unstable();
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_full_rate_keeps_everything() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert_eq!(sample_rows(&mut rng, 4, 1.0).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_selection_is_an_error() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert!(matches!(sample_rows(&mut rng, 10, 0.0), Err(Error::Validation(_))));
        assert!(matches!(sample_features(&mut rng, 3, 0.1), Err(Error::Validation(_))));
        assert!(matches!(sample_rows(&mut rng, 0, 1.0), Err(Error::Validation(_))));
    }

    #[test]
    fn test_sample_is_distinct_sorted_and_seeded() {
        let mut a = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(42);
        let sa = sample_rows(&mut a, 1000, 0.3).unwrap();
        let sb = sample_rows(&mut b, 1000, 0.3).unwrap();
        assert_eq!(sa, sb);
        assert_eq!(sa.len(), 300);
        assert!(sa.windows(2).all(|w| w[0] < w[1]));
        assert!(sa.iter().all(|&r| r < 1000));
    }
}
