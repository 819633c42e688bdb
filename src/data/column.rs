//! Typed column containers.
//!
//! Three column kinds back a [`DataStore`](super::DataStore):
//!
//! - [`BucketizedFloatColumn`]: continuous values quantized into ordered buckets,
//!   stored as a narrow integer per row plus a shared boundary table.
//! - [`RawFloatColumn`]: unquantized `f64` per row (targets, weights, features
//!   exempt from bucketization).
//! - [`StringColumn`]: dictionary-encoded categorical values.
//!
//! Slicing a column keeps its boundary table or dictionary (shared through
//! `Arc`), so a slice encodes values exactly like the column it came from.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::bucketize::{BucketBoundaries, BucketIndices, MISSING_BUCKET};

/// Category string reserved for missing values (code 0).
pub const MISSING_CATEGORY: &str = "__missing__";

/// Dictionary code of [`MISSING_CATEGORY`].
pub const MISSING_CODE: u32 = 0;

// =============================================================================
// ColumnKind
// =============================================================================

/// Discriminant of a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    BucketizedFloat,
    RawFloat,
    String,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BucketizedFloat => "bucketized_float",
            Self::RawFloat => "raw_float",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Column
// =============================================================================

/// A typed column.
#[derive(Debug, Clone)]
pub enum Column {
    BucketizedFloat(BucketizedFloatColumn),
    RawFloat(RawFloatColumn),
    String(StringColumn),
}

impl Column {
    #[inline]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::BucketizedFloat(_) => ColumnKind::BucketizedFloat,
            Self::RawFloat(_) => ColumnKind::RawFloat,
            Self::String(_) => ColumnKind::String,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::BucketizedFloat(c) => c.len(),
            Self::RawFloat(c) => c.len(),
            Self::String(c) => c.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gather the given rows into a new column of the same kind.
    ///
    /// Row indices must be in range; callers validate them.
    pub fn select(&self, rows: &[usize]) -> Column {
        match self {
            Self::BucketizedFloat(c) => Self::BucketizedFloat(c.select(rows)),
            Self::RawFloat(c) => Self::RawFloat(c.select(rows)),
            Self::String(c) => Self::String(c.select(rows)),
        }
    }
}

impl From<BucketizedFloatColumn> for Column {
    fn from(c: BucketizedFloatColumn) -> Self {
        Self::BucketizedFloat(c)
    }
}

impl From<RawFloatColumn> for Column {
    fn from(c: RawFloatColumn) -> Self {
        Self::RawFloat(c)
    }
}

impl From<StringColumn> for Column {
    fn from(c: StringColumn) -> Self {
        Self::String(c)
    }
}

// =============================================================================
// BucketizedFloatColumn
// =============================================================================

/// Continuous feature quantized into ordered buckets.
///
/// Bucket indices are monotonic in value: a larger bucket index always covers
/// larger values. Bucket [`MISSING_BUCKET`] holds NaN rows.
#[derive(Debug, Clone)]
pub struct BucketizedFloatColumn {
    indices: BucketIndices,
    boundaries: Arc<BucketBoundaries>,
}

impl BucketizedFloatColumn {
    /// Bucketize raw values into at most `num_buckets` buckets, missing included.
    pub fn from_values(values: &[f64], num_buckets: usize) -> Self {
        let mut boundaries = BucketBoundaries::from_values(values, num_buckets);
        let indices = boundaries.encode_and_observe(values);
        Self {
            indices,
            boundaries: Arc::new(boundaries),
        }
    }

    /// Encode values against an existing boundary table.
    pub fn with_boundaries(values: &[f64], boundaries: Arc<BucketBoundaries>) -> Self {
        let indices = boundaries.encode(values);
        Self { indices, boundaries }
    }

    /// Assemble a column from already computed bucket indices.
    ///
    /// Returns `None` if any index is outside the boundary table.
    pub fn from_indices(indices: Vec<u32>, boundaries: Arc<BucketBoundaries>) -> Option<Self> {
        let n_buckets = boundaries.n_buckets();
        if indices.iter().any(|&b| b as usize >= n_buckets) {
            return None;
        }
        Some(Self {
            indices: BucketIndices::from_u32(indices, n_buckets),
            boundaries,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of buckets, including the missing bucket.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.boundaries.n_buckets()
    }

    #[inline]
    pub fn bucket(&self, row: usize) -> u32 {
        self.indices.get(row)
    }

    #[inline]
    pub fn is_missing(&self, row: usize) -> bool {
        self.bucket(row) == MISSING_BUCKET
    }

    /// Upper bound of the row's bucket, `None` for missing rows.
    ///
    /// This is the value split thresholds are compared against.
    #[inline]
    pub fn value_upper(&self, row: usize) -> Option<f64> {
        match self.bucket(row) {
            MISSING_BUCKET => None,
            b => Some(self.boundaries.bucket_max(b)),
        }
    }

    /// Representative value of a row: its bucket max, NaN when missing.
    #[inline]
    pub fn decode(&self, row: usize) -> f64 {
        self.value_upper(row).unwrap_or(f64::NAN)
    }

    pub fn indices(&self) -> &BucketIndices {
        &self.indices
    }

    pub fn boundaries(&self) -> &Arc<BucketBoundaries> {
        &self.boundaries
    }

    /// Gather rows; the boundary table is shared, not recomputed.
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            indices: self.indices.select(rows),
            boundaries: Arc::clone(&self.boundaries),
        }
    }
}

// =============================================================================
// RawFloatColumn
// =============================================================================

/// Unquantized 64-bit floats. NaN marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFloatColumn {
    values: Box<[f64]>,
}

impl RawFloatColumn {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }

    /// Column with the same value on every row.
    pub fn constant(value: f64, n_rows: usize) -> Self {
        Self::new(vec![value; n_rows])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize) -> f64 {
        self.values[row]
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            values: rows.iter().map(|&r| self.values[r]).collect(),
        }
    }
}

// =============================================================================
// StringColumn
// =============================================================================

/// Stable string-to-code mapping.
///
/// Code 0 is always [`MISSING_CATEGORY`]. Other codes are assigned in order of
/// first appearance and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    values: Vec<String>,
    index: HashMap<String, u32>,
}

impl Dictionary {
    fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(MISSING_CATEGORY.to_string(), MISSING_CODE);
        Self {
            values: vec![MISSING_CATEGORY.to_string()],
            index,
        }
    }

    fn intern(&mut self, value: Option<&str>) -> u32 {
        let value = match value {
            None | Some("") => return MISSING_CODE,
            Some(v) => v,
        };
        if let Some(&code) = self.index.get(value) {
            return code;
        }
        let code = self.values.len() as u32;
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), code);
        code
    }

    /// Code of a category, if the dictionary knows it.
    ///
    /// The empty string resolves to the missing code like it does on ingest.
    #[inline]
    pub fn code_of(&self, value: &str) -> Option<u32> {
        if value.is_empty() {
            return Some(MISSING_CODE);
        }
        self.index.get(value).copied()
    }

    /// Category string of a code.
    #[inline]
    pub fn value_of(&self, code: u32) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    /// Number of codes, including the missing code.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }
}

/// Dictionary-encoded categorical column.
#[derive(Debug, Clone)]
pub struct StringColumn {
    codes: Box<[u32]>,
    dictionary: Arc<Dictionary>,
}

impl StringColumn {
    /// Encode optional strings; `None` and `""` become the missing category.
    pub fn from_options<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut dictionary = Dictionary::new();
        let codes: Box<[u32]> = values
            .into_iter()
            .map(|v| dictionary.intern(v.as_ref().map(|s| s.as_ref())))
            .collect();
        Self {
            codes,
            dictionary: Arc::new(dictionary),
        }
    }

    /// Encode strings; `""` becomes the missing category.
    pub fn from_strs<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_options(values.into_iter().map(Some))
    }

    /// Column with the same category on every row.
    pub fn constant(value: &str, n_rows: usize) -> Self {
        Self::from_strs(std::iter::repeat(value).take(n_rows))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[inline]
    pub fn code(&self, row: usize) -> u32 {
        self.codes[row]
    }

    #[inline]
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Category string of a row.
    #[inline]
    pub fn value(&self, row: usize) -> &str {
        // Codes are produced by the dictionary, so the lookup always succeeds.
        self.dictionary.value_of(self.codes[row]).unwrap_or(MISSING_CATEGORY)
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    /// Number of distinct codes, including the missing code.
    #[inline]
    pub fn n_categories(&self) -> usize {
        self.dictionary.len()
    }

    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            codes: rows.iter().map(|&r| self.codes[r]).collect(),
            dictionary: Arc::clone(&self.dictionary),
        }
    }
}
