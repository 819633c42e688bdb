//! Conversion between [`Forest`] and [`ForestDocument`].
//!
//! Nested documents are loaded breadth-first: the root is node 0 and the
//! children of every branch get the next two free ids.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::repr::{FeatureKind, FeatureTable, Forest, Node, NodeId, Split, SplitCondition, Tree};

use super::schema::{CatSplitDocument, FloatSplitDocument, ForestDocument, NodeDocument, SplitDocument};

// =============================================================================
// Forest -> document
// =============================================================================

pub(crate) fn forest_to_document(forest: &Forest) -> ForestDocument {
    ForestDocument {
        tree: forest
            .trees()
            .iter()
            .map(|tree| node_to_document(tree, 0, forest.features()))
            .collect(),
        config: forest.config().clone(),
        base_score: forest.base_score(),
    }
}

fn node_to_document(tree: &Tree, id: NodeId, features: &FeatureTable) -> NodeDocument {
    match tree.node(id) {
        Node::Leaf { score } => NodeDocument {
            left_child: None,
            right_child: None,
            split: None,
            score: *score,
        },
        Node::Branch {
            split,
            left,
            right,
            score,
        } => NodeDocument {
            left_child: Some(Box::new(node_to_document(tree, *left, features))),
            right_child: Some(Box::new(node_to_document(tree, *right, features))),
            split: Some(split_to_document(split, features)),
            score: *score,
        },
    }
}

fn split_to_document(split: &Split, features: &FeatureTable) -> SplitDocument {
    let (float_split, cat_split) = match &split.condition {
        SplitCondition::Float {
            threshold,
            missing_to_right,
        } => (
            Some(FloatSplitDocument {
                threshold: *threshold,
                missing_to_right_child: *missing_to_right,
            }),
            None,
        ),
        SplitCondition::Categorical { categories } => (
            None,
            Some(CatSplitDocument {
                category: categories.clone(),
            }),
        ),
    };
    SplitDocument {
        feature: features.name(split.feature).to_string(),
        gain: Some(split.gain),
        float_split,
        cat_split,
    }
}

// =============================================================================
// Document -> forest
// =============================================================================

/// Build a forest, checking every structural rule.
///
/// # Errors
///
/// [`Error::MalformedModel`] on the first violation found.
pub(crate) fn forest_from_document(doc: ForestDocument) -> Result<Forest> {
    let ForestDocument {
        tree: roots,
        config,
        base_score,
    } = doc;
    let mut forest = Forest::new(config, base_score).map_err(|e| Error::malformed(e.to_string()))?;
    for (index, root) in roots.iter().enumerate() {
        let tree = tree_from_document(root, forest.features())
            .map_err(|msg| Error::malformed(format!("tree {index}: {msg}")))?;
        forest.push_tree(tree);
    }
    Ok(forest)
}

fn tree_from_document(root: &NodeDocument, features: &FeatureTable) -> std::result::Result<Tree, String> {
    let mut nodes = vec![Node::Leaf { score: 0.0 }];
    let mut queue: VecDeque<(&NodeDocument, NodeId)> = VecDeque::from([(root, 0)]);
    while let Some((doc, id)) = queue.pop_front() {
        let node = match (&doc.left_child, &doc.right_child, &doc.split) {
            (None, None, None) => Node::Leaf { score: doc.score },
            (Some(l), Some(r), Some(split)) => {
                let left = nodes.len() as NodeId;
                let right = left + 1;
                nodes.push(Node::Leaf { score: 0.0 });
                nodes.push(Node::Leaf { score: 0.0 });
                queue.push_back((l, left));
                queue.push_back((r, right));
                Node::Branch {
                    split: split_from_document(split, features)?,
                    left,
                    right,
                    score: doc.score,
                }
            }
            (None, None, Some(_)) => return Err(format!("node {id} has a split but no children")),
            (Some(_), Some(_), None) => return Err(format!("node {id} has children but no split")),
            _ => return Err(format!("node {id} has exactly one child")),
        };
        nodes[id as usize] = node;
    }
    Tree::from_nodes(nodes).map_err(|e| e.to_string())
}

fn split_from_document(doc: &SplitDocument, features: &FeatureTable) -> std::result::Result<Split, String> {
    let feature = features
        .get(&doc.feature)
        .ok_or_else(|| format!("split feature '{}' is not a configured feature", doc.feature))?;
    let kind = features.kind(feature);
    let condition = match (&doc.float_split, &doc.cat_split) {
        (Some(float), None) => {
            if kind != FeatureKind::Float {
                return Err(format!("float split on categorical feature '{}'", doc.feature));
            }
            SplitCondition::Float {
                threshold: float.threshold,
                missing_to_right: float.missing_to_right_child,
            }
        }
        (None, Some(cat)) => {
            if kind != FeatureKind::Categorical {
                return Err(format!("categorical split on float feature '{}'", doc.feature));
            }
            SplitCondition::Categorical {
                categories: cat.category.clone(),
            }
        }
        (None, None) => return Err(format!("split on '{}' has no floatSplit or catSplit", doc.feature)),
        (Some(_), Some(_)) => return Err(format!("split on '{}' has both floatSplit and catSplit", doc.feature)),
    };
    Ok(Split {
        feature,
        gain: doc.gain.unwrap_or(0.0),
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CONFIG: &str = r#""config": {"float_feature": ["x"], "categorical_feature": ["c"]}"#;

    fn load(tree: &str) -> Result<Forest> {
        let json = format!(r#"{{"tree": [{tree}], {CONFIG}, "baseScore": 0.5}}"#);
        let doc: ForestDocument = serde_json::from_str(&json).unwrap();
        forest_from_document(doc)
    }

    #[test]
    fn test_breadth_first_ids() {
        let forest = load(
            r#"{"split": {"feature": "x", "floatSplit": {"threshold": 1.0}},
                "leftChild": {"split": {"feature": "c", "catSplit": {"category": ["A"]}},
                              "leftChild": {"score": 1}, "rightChild": {"score": 2}},
                "rightChild": {"score": 3}}"#,
        )
        .unwrap();
        let tree = forest.tree(0);
        assert_eq!(tree.n_nodes(), 5);
        assert_eq!(tree.node(2).score(), 3.0);
        assert_eq!(tree.node(3).score(), 1.0);
        assert_eq!(forest.base_score(), 0.5);
        assert_eq!(forest_to_document(&forest).tree.len(), 1);
    }

    #[rstest]
    #[case::one_child(r#"{"split": {"feature": "x", "floatSplit": {"threshold": 1}}, "leftChild": {}}"#)]
    #[case::split_without_children(r#"{"split": {"feature": "x", "floatSplit": {"threshold": 1}}}"#)]
    #[case::children_without_split(r#"{"leftChild": {}, "rightChild": {}}"#)]
    #[case::no_split_kind(r#"{"split": {"feature": "x"}, "leftChild": {}, "rightChild": {}}"#)]
    #[case::both_split_kinds(
        r#"{"split": {"feature": "x", "floatSplit": {"threshold": 1}, "catSplit": {"category": []}},
            "leftChild": {}, "rightChild": {}}"#
    )]
    #[case::unknown_feature(
        r#"{"split": {"feature": "y", "floatSplit": {"threshold": 1}}, "leftChild": {}, "rightChild": {}}"#
    )]
    #[case::float_split_on_categorical(
        r#"{"split": {"feature": "c", "floatSplit": {"threshold": 1}}, "leftChild": {}, "rightChild": {}}"#
    )]
    #[case::cat_split_on_float(
        r#"{"split": {"feature": "x", "catSplit": {"category": ["A"]}}, "leftChild": {}, "rightChild": {}}"#
    )]
    fn test_structural_violations(#[case] tree: &str) {
        assert!(matches!(load(tree), Err(Error::MalformedModel(_))));
    }

    #[test]
    fn test_duplicate_feature_is_malformed() {
        let json = r#"{"tree": [], "config": {"float_feature": ["x"], "categorical_feature": ["x"]}}"#;
        let doc: ForestDocument = serde_json::from_str(json).unwrap();
        assert!(matches!(forest_from_document(doc), Err(Error::MalformedModel(_))));
    }
}
