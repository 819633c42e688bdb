//! Explaining what a trained forest has learned.
//!
//! - [`importance`]: per-feature gain or split counts over all trees
//! - [`partial_dependence`]: score shift from pinning one feature to fixed values
//!
//! Both add methods to [`Forest`](crate::repr::Forest):
//!
//! ```ignore
//! let ranked = forest.feature_importance();
//! let curve = forest.partial_dependency(&store, "age", &[20.0.into(), 40.0.into()], None)?;
//! ```

pub mod importance;
pub mod partial_dependence;

pub use importance::{compute_forest_importance, ImportanceType};
pub use partial_dependence::{DependencyPoint, FeatureValue};
