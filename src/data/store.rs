//! The in-memory training/inference matrix.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::column::{BucketizedFloatColumn, Column, ColumnKind, RawFloatColumn, StringColumn};

/// Ordered mapping of unique column names to columns sharing one row count.
///
/// The row count is fixed by the first column added. Every mutation keeps the
/// store consistent: an operation either succeeds completely or leaves the
/// store untouched.
///
/// # Example
///
/// ```
/// use gbforest::data::DataStore;
///
/// let mut store = DataStore::new();
/// store.add_bucketized_float_column("x", &[0.0, 1.0, 2.0], 256).unwrap();
/// store.add_string_column("color", ["red", "blue", ""]).unwrap();
/// assert_eq!(store.n_rows(), 3);
/// assert!(store.add_raw_float_column("y", vec![1.0]).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    names: Vec<String>,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    n_rows: Option<usize>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (0 for a store without columns).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows.unwrap_or(0)
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Iterate `(name, column)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add or replace a column.
    ///
    /// # Errors
    ///
    /// - [`Error::TypeMismatch`] if a column with this name exists with a
    ///   different kind.
    /// - [`Error::Validation`] if the row count differs from the store's.
    pub fn add_column(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<()> {
        let name = name.into();
        let column = column.into();
        let len = column.len();

        if let Some(&pos) = self.index.get(&name) {
            let existing = self.columns[pos].kind();
            if existing != column.kind() {
                return Err(Error::TypeMismatch {
                    name,
                    expected: existing,
                    found: column.kind(),
                });
            }
        }
        self.check_rows(&name, len)?;

        match self.index.get(&name) {
            Some(&pos) => self.columns[pos] = column,
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.names.push(name);
                self.columns.push(column);
            }
        }
        self.n_rows = Some(len);
        Ok(())
    }

    /// Bucketize `values` and add them as a column.
    pub fn add_bucketized_float_column(
        &mut self,
        name: impl Into<String>,
        values: &[f64],
        num_buckets: usize,
    ) -> Result<()> {
        self.add_column(name, BucketizedFloatColumn::from_values(values, num_buckets))
    }

    pub fn add_raw_float_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        self.add_column(name, RawFloatColumn::new(values))
    }

    pub fn add_string_column<I, S>(&mut self, name: impl Into<String>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_column(name, StringColumn::from_strs(values))
    }

    /// Remove a column and return it.
    ///
    /// Removing the last column resets the row count.
    pub fn erase(&mut self, name: &str) -> Result<Column> {
        let pos = self
            .index
            .remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.names.remove(pos);
        let column = self.columns.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        if self.columns.is_empty() {
            self.n_rows = None;
        }
        Ok(column)
    }

    /// Move all columns of `other` into this store.
    ///
    /// Both stores must have the same row count. A name present in both must
    /// have the same kind; the column from `other` replaces the existing one.
    pub fn merge(&mut self, other: DataStore) -> Result<()> {
        if self.n_rows.is_some() && other.n_rows.is_some() && self.n_rows != other.n_rows {
            return Err(Error::validation(format!(
                "cannot merge stores with {} and {} rows",
                self.n_rows(),
                other.n_rows()
            )));
        }
        for (name, column) in other.iter() {
            if let Some(&pos) = self.index.get(name) {
                let existing = self.columns[pos].kind();
                if existing != column.kind() {
                    return Err(Error::TypeMismatch {
                        name: name.to_string(),
                        expected: existing,
                        found: column.kind(),
                    });
                }
            }
        }
        for (name, column) in other.names.into_iter().zip(other.columns) {
            self.add_column(name, column)?;
        }
        Ok(())
    }

    /// New store containing only `rows`, in the given order.
    ///
    /// Column kinds, bucket boundaries and dictionaries are preserved.
    pub fn slice(&self, rows: &[usize]) -> Result<DataStore> {
        let n_rows = self.n_rows();
        if let Some(&bad) = rows.iter().find(|&&r| r >= n_rows) {
            return Err(Error::validation(format!(
                "row index {bad} out of range for store with {n_rows} rows"
            )));
        }
        let columns: Vec<Column> = self.columns.iter().map(|c| c.select(rows)).collect();
        Ok(DataStore {
            names: self.names.clone(),
            columns,
            index: self.index.clone(),
            n_rows: self.n_rows.map(|_| rows.len()),
        })
    }

    fn check_rows(&self, name: &str, len: usize) -> Result<()> {
        match self.n_rows {
            // Replacing the only column may change the row count.
            Some(n) if n != len && !(self.columns.len() == 1 && self.index.contains_key(name)) => {
                Err(Error::validation(format!(
                    "column '{name}' has {len} rows, store has {n}"
                )))
            }
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.index
            .get(name)
            .map(|&pos| &self.columns[pos])
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn bucketized_float_column(&self, name: &str) -> Result<&BucketizedFloatColumn> {
        match self.column(name)? {
            Column::BucketizedFloat(c) => Ok(c),
            other => Err(mismatch(name, ColumnKind::BucketizedFloat, other)),
        }
    }

    pub fn raw_float_column(&self, name: &str) -> Result<&RawFloatColumn> {
        match self.column(name)? {
            Column::RawFloat(c) => Ok(c),
            other => Err(mismatch(name, ColumnKind::RawFloat, other)),
        }
    }

    pub fn string_column(&self, name: &str) -> Result<&StringColumn> {
        match self.column(name)? {
            Column::String(c) => Ok(c),
            other => Err(mismatch(name, ColumnKind::String, other)),
        }
    }
}

fn mismatch(name: &str, expected: ColumnKind, found: &Column) -> Error {
    Error::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DataStore {
        let mut store = DataStore::new();
        store
            .add_bucketized_float_column("x", &[0.0, 1.0, 2.0, 3.0], 256)
            .unwrap();
        store.add_raw_float_column("y", vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        store.add_string_column("c", ["a", "b", "a", ""]).unwrap();
        store
    }

    #[test]
    fn test_add_and_lookup() {
        let s = store();
        assert_eq!(s.n_rows(), 4);
        assert_eq!(s.n_columns(), 3);
        assert_eq!(s.column_names().collect::<Vec<_>>(), vec!["x", "y", "c"]);
        assert!(s.raw_float_column("y").is_ok());
        assert!(matches!(s.column("nope"), Err(Error::NotFound(_))));
        assert!(matches!(s.string_column("y"), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_row_count_mismatch_fails() {
        let mut s = store();
        let err = s.add_raw_float_column("w", vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!s.contains("w"));
    }

    #[test]
    fn test_kind_change_fails_and_same_kind_replaces() {
        let mut s = store();
        let err = s.add_string_column("y", ["a", "b", "c", "d"]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        s.add_raw_float_column("y", vec![5.0; 4]).unwrap();
        assert_eq!(s.raw_float_column("y").unwrap().get(0), 5.0);
        assert_eq!(s.n_columns(), 3);
    }

    #[test]
    fn test_erase_reindexes() {
        let mut s = store();
        let removed = s.erase("x").unwrap();
        assert_eq!(removed.kind(), ColumnKind::BucketizedFloat);
        assert_eq!(s.string_column("c").unwrap().value(0), "a");
        assert!(matches!(s.erase("x"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_slice_preserves_kinds_and_boundaries() {
        let s = store();
        let sliced = s.slice(&[3, 1]).unwrap();
        assert_eq!(sliced.n_rows(), 2);
        let x = s.bucketized_float_column("x").unwrap();
        let sx = sliced.bucketized_float_column("x").unwrap();
        assert!(std::sync::Arc::ptr_eq(x.boundaries(), sx.boundaries()));
        assert_eq!(sx.bucket(0), x.bucket(3));
        assert_eq!(sliced.raw_float_column("y").unwrap().values(), &[1.0, 0.0]);
        assert!(s.slice(&[4]).is_err());
    }

    #[test]
    fn test_merge() {
        let mut s = store();
        let mut other = DataStore::new();
        other.add_raw_float_column("w", vec![1.0; 4]).unwrap();
        other.add_raw_float_column("y", vec![2.0; 4]).unwrap();
        s.merge(other).unwrap();
        assert_eq!(s.n_columns(), 4);
        assert_eq!(s.raw_float_column("y").unwrap().get(0), 2.0);

        let mut bad = DataStore::new();
        bad.add_raw_float_column("z", vec![1.0; 2]).unwrap();
        assert!(matches!(s.merge(bad), Err(Error::Validation(_))));

        let mut clash = DataStore::new();
        clash.add_string_column("x", ["a", "b", "c", "d"]).unwrap();
        assert!(matches!(s.merge(clash), Err(Error::TypeMismatch { .. })));
    }
}
