//! Targets, weights and query groups resolved from store columns.

use std::collections::HashMap;

use crate::data::{Column, ColumnKind, DataStore};
use crate::error::{Error, Result};

use super::config::TrainingConfig;

/// Target vector named by `config.target_column`.
///
/// - A raw float target is used as is, or mapped to +1/-1 by
///   `value > target_threshold` when `binarize_target` is set.
/// - A string target maps to +1 when its value is one of
///   `positive_category`, otherwise -1.
///
/// # Example
///
/// ```
/// use gbforest::data::DataStore;
/// use gbforest::training::{resolve_targets, TrainingConfig};
///
/// let mut store = DataStore::new();
/// store.add_string_column("label", ["spam", "ham", "spam"]).unwrap();
/// let config = TrainingConfig::builder()
///     .target_column("label".into())
///     .positive_category(vec!["spam".into()])
///     .build()
///     .unwrap();
/// assert_eq!(resolve_targets(&store, &config).unwrap(), vec![1.0, -1.0, 1.0]);
/// ```
pub fn resolve_targets(store: &DataStore, config: &TrainingConfig) -> Result<Vec<f64>> {
    let name = config
        .target_column
        .as_deref()
        .ok_or_else(|| Error::validation("target_column is not set"))?;

    match store.column(name)? {
        Column::RawFloat(col) => {
            if config.binarize_target {
                let threshold = config.target_threshold;
                Ok(col
                    .values()
                    .iter()
                    .map(|&v| if v > threshold { 1.0 } else { -1.0 })
                    .collect())
            } else {
                Ok(col.values().to_vec())
            }
        }
        Column::String(col) => {
            if config.positive_category.is_empty() {
                return Err(Error::validation(format!(
                    "string target '{name}' needs positive_category"
                )));
            }
            let positive: Vec<u32> = config
                .positive_category
                .iter()
                .filter_map(|c| col.dictionary().code_of(c))
                .collect();
            Ok(col
                .codes()
                .iter()
                .map(|code| if positive.contains(code) { 1.0 } else { -1.0 })
                .collect())
        }
        other => Err(Error::TypeMismatch {
            name: name.to_string(),
            expected: ColumnKind::RawFloat,
            found: other.kind(),
        }),
    }
}

/// Weights from `config.weight_column`, or uniform 1.0.
pub fn resolve_weights(store: &DataStore, config: &TrainingConfig) -> Result<Vec<f64>> {
    match config.weight_column.as_deref() {
        Some(name) => Ok(store.raw_float_column(name)?.values().to_vec()),
        None => Ok(vec![1.0; store.n_rows()]),
    }
}

// =============================================================================
// Groups
// =============================================================================

/// Partition of rows into query groups for pairwise losses.
///
/// Groups are numbered by first appearance; rows keep their store order
/// inside each group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groups {
    groups: Vec<Vec<u32>>,
}

impl Groups {
    /// All rows form one group.
    pub fn single(n_rows: usize) -> Self {
        let rows = (0..n_rows as u32).collect::<Vec<_>>();
        Self {
            groups: if rows.is_empty() { Vec::new() } else { vec![rows] },
        }
    }

    /// Rows sharing a value form a group. Accepts string and raw float columns.
    pub fn from_column(name: &str, column: &Column) -> Result<Self> {
        match column {
            Column::String(col) => Ok(Self::from_keys(col.codes().iter().copied())),
            Column::RawFloat(col) => Ok(Self::from_keys(col.values().iter().map(|v| {
                // All NaNs share one group; -0.0 joins 0.0.
                if v.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    (v + 0.0).to_bits()
                }
            }))),
            other => Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: ColumnKind::String,
                found: other.kind(),
            }),
        }
    }

    fn from_keys<K, I>(keys: I) -> Self
    where
        K: std::hash::Hash + Eq,
        I: IntoIterator<Item = K>,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut groups: Vec<Vec<u32>> = Vec::new();
        for (row, key) in keys.into_iter().enumerate() {
            let next = groups.len();
            let g = *index.entry(key).or_insert(next);
            if g == next {
                groups.push(Vec::new());
            }
            groups[g].push(row as u32);
        }
        Self { groups }
    }

    /// Groups from `config.group_column`, or a single group.
    pub fn resolve(store: &DataStore, config: &TrainingConfig) -> Result<Self> {
        match config.group_column.as_deref() {
            Some(name) => Self::from_column(name, store.column(name)?),
            None => Ok(Self::single(store.n_rows())),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Rows of group `g`.
    #[inline]
    pub fn rows(&self, g: usize) -> &[u32] {
        &self.groups[g]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        self.groups.iter().map(Vec::as_slice)
    }
}
