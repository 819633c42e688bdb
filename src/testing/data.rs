//! Seeded synthetic datasets.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::DataStore;

/// Categories used by [`synthetic_mixed`], with their additive effect.
pub const CATEGORY_EFFECTS: [(&str, f64); 5] = [("A", -1.0), ("B", -0.5), ("C", 0.0), ("D", 0.5), ("E", 1.0)];

/// A store plus the names and targets needed to train on it.
#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub store: DataStore,
    pub targets: Vec<f64>,
    pub float_features: Vec<String>,
    pub categorical_features: Vec<String>,
}

/// Float feature names `f0, f1, ...`.
pub fn feature_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("f{i}")).collect()
}

/// Uniform values in `[min, max]`, one `Vec` per column.
pub fn random_columns(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Vec<Vec<f64>> {
    assert!(max >= min);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let width = max - min;
    (0..cols)
        .map(|_| (0..rows).map(|_| min + rng.gen::<f64>() * width).collect())
        .collect()
}

/// Float features in `[-1, 1]` and a linear target plus uniform noise.
///
/// The target is also stored as the raw float column `"y"`.
pub fn synthetic_regression(rows: usize, cols: usize, seed: u64, noise: f64) -> SyntheticData {
    let columns = random_columns(rows, cols, seed, -1.0, 1.0);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(1));
    let coefs: Vec<f64> = (0..cols).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect();
    let targets: Vec<f64> = (0..rows)
        .map(|r| {
            let y: f64 = columns.iter().zip(&coefs).map(|(c, w)| c[r] * w).sum();
            y + (rng.gen::<f64>() * 2.0 - 1.0) * noise
        })
        .collect();

    let names = feature_names(cols);
    let mut store = DataStore::new();
    for (name, values) in names.iter().zip(columns) {
        add(&mut store, name, values);
    }
    add(&mut store, "y", targets.clone());
    SyntheticData {
        store,
        targets,
        float_features: names,
        categorical_features: Vec::new(),
    }
}

/// [`synthetic_regression`] with targets mapped to +1 / -1 by sign.
pub fn synthetic_binary(rows: usize, cols: usize, seed: u64, noise: f64) -> SyntheticData {
    let mut data = synthetic_regression(rows, cols, seed, noise);
    for t in &mut data.targets {
        *t = if *t > 0.0 { 1.0 } else { -1.0 };
    }
    data
}

/// Regression data with one extra categorical feature `"cat"` drawn from
/// [`CATEGORY_EFFECTS`]; about a tenth of its values are missing.
pub fn synthetic_mixed(rows: usize, cols: usize, seed: u64) -> SyntheticData {
    let mut data = synthetic_regression(rows, cols, seed, 0.0);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(2));
    let mut categories = Vec::with_capacity(rows);
    for target in &mut data.targets {
        if rng.gen::<f64>() < 0.1 {
            categories.push(None);
        } else {
            let (name, effect) = CATEGORY_EFFECTS[rng.gen_range(0..CATEGORY_EFFECTS.len())];
            *target += effect;
            categories.push(Some(name));
        }
    }
    let column = crate::data::StringColumn::from_options(categories);
    assert!(data.store.add_column("cat", column).is_ok());
    data.categorical_features.push("cat".into());
    data
}

/// Ranking data: `n_groups` queries of `group_size` rows each, a string
/// group column `"query"` and graded relevance 0..=3 from a rounded linear
/// score of the features.
pub fn synthetic_ranking(n_groups: usize, group_size: usize, cols: usize, seed: u64) -> SyntheticData {
    let rows = n_groups * group_size;
    let mut data = synthetic_regression(rows, cols.max(1), seed, 0.1);
    for t in &mut data.targets {
        *t = ((*t + 1.0) * 2.0).round().clamp(0.0, 3.0);
    }
    let queries: Vec<String> = (0..rows).map(|r| format!("q{}", r / group_size)).collect();
    assert!(data.store.add_string_column("query", queries).is_ok());
    data
}

/// Deterministic train/valid split of row indices.
///
/// Returns `(train, valid)`.
pub fn split_indices(rows: usize, valid_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    assert!((0.0..1.0).contains(&valid_fraction));
    let mut idx: Vec<usize> = (0..rows).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    let valid_len = ((rows as f64 * valid_fraction).round() as usize).min(rows);
    let (valid, train) = idx.split_at(valid_len);
    (train.to_vec(), valid.to_vec())
}

fn add(store: &mut DataStore, name: &str, values: Vec<f64>) {
    assert!(store.add_raw_float_column(name, values).is_ok(), "column '{name}' has the wrong length");
}
