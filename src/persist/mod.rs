//! JSON persistence of forests.
//!
//! The document layout is described in [`schema`]. Every tree is written as
//! nested nodes; split features are written by name so a model stays
//! readable without its feature table.
//!
//! # Example
//!
//! ```
//! use gbforest::repr::Forest;
//! use gbforest::training::TrainingConfig;
//!
//! let forest = Forest::new(TrainingConfig::default(), 0.25).unwrap();
//! let json = forest.to_json_string().unwrap();
//! let restored = Forest::from_json_str(&json).unwrap();
//! assert_eq!(restored.base_score(), 0.25);
//! ```

mod convert;
pub mod schema;

pub use schema::{CatSplitDocument, FloatSplitDocument, ForestDocument, NodeDocument, SplitDocument};

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::repr::Forest;

/// JSON persistence methods.
impl Forest {
    /// Document form of the forest.
    pub fn to_document(&self) -> ForestDocument {
        convert::forest_to_document(self)
    }

    /// Build a forest from a parsed document.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedModel`] on structural violations.
    pub fn from_document(doc: ForestDocument) -> Result<Forest> {
        convert::forest_from_document(doc)
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Parse a JSON model.
    ///
    /// Trees nest one JSON object per level, so the parser runs without a
    /// recursion limit and grows its stack on demand.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedModel`] for invalid JSON as well as structural
    /// violations.
    pub fn from_json_str(json: &str) -> Result<Forest> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let doc = ForestDocument::deserialize(serde_stacker::Deserializer::new(&mut de))
            .and_then(|doc| de.end().map(|()| doc))
            .map_err(|e| Error::malformed(format!("invalid model JSON: {e}")))?;
        Self::from_document(doc)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json_string()?;
        fs::write(path.as_ref(), json)?;
        log::debug!("saved {} trees to {}", self.n_trees(), path.as_ref().display());
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Forest> {
        let json = fs::read_to_string(path.as_ref())?;
        let forest = Self::from_json_str(&json)?;
        log::debug!("loaded {} trees from {}", forest.n_trees(), path.as_ref().display());
        Ok(forest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{MutableTree, Split, SplitCondition};
    use crate::training::TrainingConfig;

    fn forest() -> Forest {
        let config = TrainingConfig {
            float_feature: vec!["x".into()],
            categorical_feature: vec!["c".into()],
            ..Default::default()
        };
        let mut forest = Forest::new(config, 0.5).unwrap();
        let mut tree = MutableTree::new(0.0);
        let (left, _) = tree.split_leaf(
            0,
            Split {
                feature: 1,
                gain: 2.5,
                condition: SplitCondition::Categorical {
                    categories: vec!["C".into(), "A".into()],
                },
            },
            -1.0,
            1.0,
        );
        tree.split_leaf(
            left,
            Split {
                feature: 0,
                gain: 0.5,
                condition: SplitCondition::Float {
                    threshold: 2.0,
                    missing_to_right: true,
                },
            },
            -2.0,
            0.0,
        );
        forest.push_tree(tree.freeze());
        forest
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let f = forest();
        let json = f.to_json_string().unwrap();
        let restored = Forest::from_json_str(&json).unwrap();
        assert_eq!(restored, f);
        assert_eq!(restored.to_json_string().unwrap(), json);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(Forest::from_json_str("{\"tree\": ["), Err(Error::MalformedModel(_))));
        assert!(matches!(Forest::from_json_str("{\"tree\": 3}"), Err(Error::MalformedModel(_))));
    }
}
