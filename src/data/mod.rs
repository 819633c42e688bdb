//! Columnar in-memory data.
//!
//! A [`DataStore`] is an ordered set of named, typed [`Column`]s that all share
//! one row count. It is the matrix both training and scoring read from.
//!
//! # Column kinds
//!
//! - [`BucketizedFloatColumn`]: values quantized against a shared
//!   [`BucketBoundaries`] table, one narrow index per row.
//! - [`RawFloatColumn`]: plain `f64` per row; NaN is missing.
//! - [`StringColumn`]: dictionary-encoded categories; code 0 is missing.
//!
//! # Missing Values
//!
//! Bucket [`MISSING_BUCKET`] and category code [`MISSING_CODE`] are reserved
//! for missing values and are handled as their own histogram slot in training.

mod bucketize;
mod column;
mod store;

pub use bucketize::{BinIndex, BucketBoundaries, BucketIndices, DEFAULT_NUM_BUCKETS, MISSING_BUCKET};
pub use column::{
    BucketizedFloatColumn, Column, ColumnKind, Dictionary, RawFloatColumn, StringColumn,
    MISSING_CATEGORY, MISSING_CODE,
};
pub use store::DataStore;
