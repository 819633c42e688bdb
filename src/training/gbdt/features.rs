//! Training-time view of the feature columns.
//!
//! Every feature is reduced to one small integer per row: a bucket index for
//! float features, a dictionary code for categorical ones. Raw float columns
//! are bucketized once when the view is built.

use std::borrow::Cow;

use crate::data::{BucketizedFloatColumn, Column, ColumnKind, DataStore, StringColumn};
use crate::error::{Error, Result};
use crate::repr::{FeatureKind, FeatureTable};

/// Integer-coded column of one feature.
#[derive(Debug, Clone)]
pub enum FeatureBins<'a> {
    Float(Cow<'a, BucketizedFloatColumn>),
    Categorical(&'a StringColumn),
}

impl FeatureBins<'_> {
    /// Histogram length: bucket count or category count.
    pub fn n_bins(&self) -> usize {
        match self {
            Self::Float(column) => column.n_buckets(),
            Self::Categorical(column) => column.n_categories(),
        }
    }

    #[inline]
    pub fn bin(&self, row: usize) -> u32 {
        match self {
            Self::Float(column) => column.bucket(row),
            Self::Categorical(column) => column.code(row),
        }
    }
}

/// All configured features of one training store, in canonical order.
#[derive(Debug)]
pub struct TrainingFeatures<'a> {
    bins: Vec<FeatureBins<'a>>,
    n_rows: usize,
}

impl<'a> TrainingFeatures<'a> {
    /// Resolve every feature of `table` against `store`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if a feature has no column.
    /// - [`Error::TypeMismatch`] if a float feature is a string column or a
    ///   categorical feature is not.
    pub fn resolve(store: &'a DataStore, table: &FeatureTable, num_buckets: usize) -> Result<Self> {
        let mut bins = Vec::with_capacity(table.len());
        for (_, name, kind) in table.iter() {
            let column = store.column(name)?;
            let feature = match (kind, column) {
                (FeatureKind::Float, Column::BucketizedFloat(c)) => FeatureBins::Float(Cow::Borrowed(c)),
                (FeatureKind::Float, Column::RawFloat(c)) => {
                    log::debug!("bucketizing raw feature '{name}' into {num_buckets} buckets");
                    FeatureBins::Float(Cow::Owned(BucketizedFloatColumn::from_values(c.values(), num_buckets)))
                }
                (FeatureKind::Categorical, Column::String(c)) => FeatureBins::Categorical(c),
                (FeatureKind::Float, other) => {
                    return Err(mismatch(name, ColumnKind::BucketizedFloat, other));
                }
                (FeatureKind::Categorical, other) => {
                    return Err(mismatch(name, ColumnKind::String, other));
                }
            };
            bins.push(feature);
        }
        Ok(Self {
            bins,
            n_rows: store.n_rows(),
        })
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn feature(&self, feature: u32) -> &FeatureBins<'a> {
        &self.bins[feature as usize]
    }
}

fn mismatch(name: &str, expected: ColumnKind, found: &Column) -> Error {
    Error::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
