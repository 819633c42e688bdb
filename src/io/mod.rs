//! File-system glue around the engine.
//!
//! - [`flatfile`]: one column per file, with an optional dtype header
//! - [`scores`]: checkpointed score files
//!
//! Model files are handled by [`crate::persist`].

pub mod flatfile;
pub mod scores;

pub use flatfile::{load_columns, read_column, FlatfileDtype};
pub use scores::{checkpoints_from_interval, write_checkpoint_scores};
