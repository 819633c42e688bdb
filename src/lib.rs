//! gbforest: gradient boosted decision trees over a typed column store.
//!
//! Training, scoring, explaining and persisting forests of regression trees
//! for pointwise (squared error, log loss, huberized hinge) and pairwise
//! ranking losses (AUC, pairwise log loss, GBRank, LambdaMART).
//!
//! # Key Types
//!
//! - [`DataStore`] - named, typed columns sharing one row count
//! - [`TrainingConfig`] - every knob of a boosting run, also stored in models
//! - [`GBDTTrainer`] / [`BoostingSession`] - fit a [`Forest`] tree by tree
//! - [`Forest`] - predict, checkpointed scores, importance, JSON persistence
//!
//! # Example
//!
//! ```
//! use gbforest::{DataStore, GBDTTrainer, TrainingConfig};
//!
//! let mut store = DataStore::new();
//! store.add_raw_float_column("x", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let config = TrainingConfig::builder()
//!     .float_feature(vec!["x".into()])
//!     .num_trees(1)
//!     .num_leaves(2)
//!     .shrinkage(1.0)
//!     .num_threads(1)
//!     .build()
//!     .unwrap();
//! let forest = GBDTTrainer::new(config).train(&store, &[0.0, 0.0, 1.0, 1.0], &[], None).unwrap();
//! assert_eq!(forest.predict(&store).unwrap().to_vec(), vec![0.0, 0.0, 1.0, 1.0]);
//! ```

// Re-export approx traits for users who want to compare scores
pub use approx;

pub mod data;
pub mod error;
pub mod explainability;
pub mod inference;
pub mod io;
pub mod persist;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{Error, Result};

pub use data::{Column, ColumnKind, DataStore};
pub use repr::{FeatureKind, Forest, Tree};

pub use training::{BoostingSession, GBDTTrainer, LossFunction, TrainingConfig, Verbosity};

pub use explainability::{DependencyPoint, FeatureValue, ImportanceType};

pub use utils::{run_with_threads, Parallelism};
