//! Partial dependency of forest scores on one feature.
//!
//! For a value `v`, every row's feature is replaced with `v` and the score
//! compared against the score with the feature set to a base value. The
//! result is the mean and population standard deviation of those
//! differences over rows.

use crate::data::{Column, DataStore, RawFloatColumn, StringColumn};
use crate::error::{Error, Result};
use crate::repr::{FeatureKind, Forest};

/// A value to pin a feature to.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Float(f64),
    Category(String),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Category(value.to_string())
    }
}

/// Score shift at one feature value.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyPoint {
    pub value: FeatureValue,
    pub mean: f64,
    pub std: f64,
}

/// Partial dependency methods.
impl Forest {
    /// Score shift of pinning `feature` to each of `values`.
    ///
    /// `base` defaults to missing (NaN) for float features and to the first
    /// value for categorical features. The store is copied; the caller's
    /// store is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `feature` is not a feature of this forest,
    ///   a value has the wrong kind, or the store has no rows.
    /// - Any scoring error for the other features.
    pub fn partial_dependency(
        &self,
        store: &DataStore,
        feature: &str,
        values: &[FeatureValue],
        base: Option<FeatureValue>,
    ) -> Result<Vec<DependencyPoint>> {
        let index = self
            .features()
            .get(feature)
            .ok_or_else(|| Error::validation(format!("'{feature}' is not a feature of this forest")))?;
        let kind = self.features().kind(index);
        for value in values.iter().chain(base.as_ref()) {
            check_kind(feature, kind, value)?;
        }
        let n_rows = store.n_rows();
        if n_rows == 0 {
            return Err(Error::validation("partial dependency needs at least one row"));
        }
        let base = match (base, kind) {
            (Some(base), _) => base,
            (None, FeatureKind::Float) => FeatureValue::Float(f64::NAN),
            (None, FeatureKind::Categorical) => match values.first() {
                Some(first) => first.clone(),
                None => return Ok(Vec::new()),
            },
        };

        let mut pinned = store.clone();
        let base_scores = self.predict(pin(&mut pinned, feature, &base, n_rows)?)?;
        let mut points = Vec::with_capacity(values.len());
        for value in values {
            let scores = self.predict(pin(&mut pinned, feature, value, n_rows)?)?;
            let n = n_rows as f64;
            let deltas: Vec<f64> = scores.iter().zip(base_scores.iter()).map(|(s, b)| s - b).collect();
            let mean = deltas.iter().sum::<f64>() / n;
            let variance = deltas.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;
            points.push(DependencyPoint {
                value: value.clone(),
                mean,
                std: variance.sqrt(),
            });
        }
        Ok(points)
    }
}

fn check_kind(feature: &str, kind: FeatureKind, value: &FeatureValue) -> Result<()> {
    match (kind, value) {
        (FeatureKind::Float, FeatureValue::Float(_)) | (FeatureKind::Categorical, FeatureValue::Category(_)) => {
            Ok(())
        }
        (FeatureKind::Float, FeatureValue::Category(c)) => Err(Error::validation(format!(
            "float feature '{feature}' cannot take category '{c}'"
        ))),
        (FeatureKind::Categorical, FeatureValue::Float(v)) => Err(Error::validation(format!(
            "categorical feature '{feature}' cannot take number {v}"
        ))),
    }
}

/// Replace `feature` in `store` with a constant column.
fn pin<'s>(store: &'s mut DataStore, feature: &str, value: &FeatureValue, n_rows: usize) -> Result<&'s DataStore> {
    if store.contains(feature) {
        store.erase(feature)?;
    }
    let column = match value {
        FeatureValue::Float(v) => Column::from(RawFloatColumn::constant(*v, n_rows)),
        FeatureValue::Category(c) => Column::from(StringColumn::constant(c, n_rows)),
    };
    store.add_column(feature, column)?;
    Ok(store)
}
