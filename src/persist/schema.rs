//! Serde schema of the forest JSON document.
//!
//! ```text
//! {
//!   "tree": [ <node>, ... ],
//!   "config": { ...TrainingConfig... },
//!   "baseScore": 0.5
//! }
//!
//! node   := { "leftChild": node, "rightChild": node, "split": split, "score": f }
//!         | { "score": f }
//! split  := { "feature": name, "gain": f,
//!             "floatSplit": { "threshold": f, "missingToRightChild": b } }
//!         | { "feature": name, "gain": f,
//!             "catSplit": { "category": [name, ...] } }
//! ```
//!
//! Unknown fields are ignored on read. The schema types accept any
//! combination of optional fields; structural rules are checked when a
//! document is converted into a [`Forest`](crate::repr::Forest).

use serde::{Deserialize, Serialize};

use crate::training::TrainingConfig;

/// Whole model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestDocument {
    /// Tree roots in boosting order.
    #[serde(default)]
    pub tree: Vec<NodeDocument>,
    #[serde(default)]
    pub config: TrainingConfig,
    #[serde(default)]
    pub base_score: f64,
}

/// One node with its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_child: Option<Box<NodeDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_child: Option<Box<NodeDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitDocument>,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDocument {
    /// Feature name as listed in the config.
    pub feature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_split: Option<FloatSplitDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat_split: Option<CatSplitDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatSplitDocument {
    pub threshold: f64,
    #[serde(default)]
    pub missing_to_right_child: bool,
}

/// Categories sent to the left child, in stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatSplitDocument {
    #[serde(default)]
    pub category: Vec<String>,
}
