//! Crate-wide error type.
//!
//! Every fallible public operation returns [`Result`]. The variants mirror how
//! failures are handled by callers:
//!
//! - [`Error::Validation`]: bad configuration or inputs, surfaced immediately.
//! - [`Error::NotFound`] / [`Error::TypeMismatch`]: column lookups.
//! - [`Error::MalformedModel`]: a serialized forest violates the tree structure.
//! - [`Error::Diverged`]: scores became non-finite during boosting.

use crate::data::ColumnKind;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the column store, training, scoring and persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, mismatched lengths, empty feature sets or
    /// degenerate sampling.
    #[error("validation error: {0}")]
    Validation(String),

    /// A named column does not exist.
    #[error("column not found: {0}")]
    NotFound(String),

    /// A column exists but has a different kind than required.
    #[error("type mismatch for column '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    /// A serialized forest is structurally invalid.
    #[error("malformed model: {0}")]
    MalformedModel(String),

    /// Accumulated scores became NaN or infinite.
    #[error("training diverged at iteration {iteration}; try adding regularization (l2_lambda)")]
    Diverged { iteration: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for [`Error::MalformedModel`].
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedModel(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message_names_both_kinds() {
        let err = Error::TypeMismatch {
            name: "age".into(),
            expected: ColumnKind::BucketizedFloat,
            found: ColumnKind::String,
        };
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("bucketized_float"));
        assert!(msg.contains("string"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
