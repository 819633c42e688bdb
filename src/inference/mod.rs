//! Inference infrastructure for trained forests.
//!
//! # Module Structure
//!
//! - [`traversal`]: binding features to store columns, compiled trees
//! - [`predictor`]: block-wise scoring, checkpointed scoring
//!
//! # Quick Start
//!
//! ```ignore
//! let scores = forest.predict(&store)?;
//! let grid = forest.predict_at_checkpoints(&store, &[10, 50, 100])?;
//! ```

mod bitset;
pub mod predictor;
pub mod traversal;

pub use bitset::CodeSet;
pub use predictor::{Predictor, DEFAULT_BLOCK_SIZE};
pub use traversal::{ColumnBinding, CompiledTree, FeatureAccess};
