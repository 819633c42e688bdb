//! Binding trees to store columns and walking them.
//!
//! A [`ColumnBinding`] resolves the forest's features to columns of one
//! [`DataStore`] once. A [`CompiledTree`] is a tree whose categorical splits
//! were turned into [`CodeSet`]s against those columns' dictionaries.
//!
//! # Routing
//!
//! - Float split: a row goes left iff it is not missing and its value is
//!   below the threshold. The value of a bucketized row is its bucket's max;
//!   a raw row uses its own value. Missing rows go left unless the split says
//!   `missing_to_right`.
//! - Categorical split: listed categories go left, all others go right.

use crate::data::{BucketizedFloatColumn, Column, ColumnKind, DataStore, RawFloatColumn, StringColumn};
use crate::error::{Error, Result};
use crate::repr::{FeatureKind, FeatureTable, Node, NodeId, SplitCondition, Tree};

use super::bitset::CodeSet;

// =============================================================================
// ColumnBinding
// =============================================================================

/// How one feature is read from the store.
#[derive(Debug, Clone, Copy)]
pub enum FeatureAccess<'a> {
    Bucketized(&'a BucketizedFloatColumn),
    Raw(&'a RawFloatColumn),
    Categorical(&'a StringColumn),
    /// Not referenced by any split; never read.
    Unused,
}

impl FeatureAccess<'_> {
    /// Float value of a row, NaN when missing.
    #[inline]
    pub fn value(&self, row: usize) -> f64 {
        match self {
            Self::Bucketized(c) => c.decode(row),
            Self::Raw(c) => c.get(row),
            Self::Categorical(_) | Self::Unused => f64::NAN,
        }
    }

    /// Dictionary code of a row.
    #[inline]
    pub fn code(&self, row: usize) -> u32 {
        match self {
            Self::Categorical(c) => c.code(row),
            _ => crate::data::MISSING_CODE,
        }
    }
}

/// Feature table resolved against one store.
#[derive(Debug, Clone)]
pub struct ColumnBinding<'a> {
    features: Vec<FeatureAccess<'a>>,
    n_rows: usize,
}

impl<'a> ColumnBinding<'a> {
    /// Resolve every feature flagged in `used`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if a used feature has no column.
    /// - [`Error::TypeMismatch`] if a float feature is backed by a string
    ///   column or a categorical feature by a non-string column.
    pub fn bind(store: &'a DataStore, table: &FeatureTable, used: &[bool]) -> Result<Self> {
        let mut features = Vec::with_capacity(table.len());
        for (index, name, kind) in table.iter() {
            if !used.get(index as usize).copied().unwrap_or(false) {
                features.push(FeatureAccess::Unused);
                continue;
            }
            let column = store.column(name)?;
            let access = match (kind, column) {
                (FeatureKind::Float, Column::BucketizedFloat(c)) => FeatureAccess::Bucketized(c),
                (FeatureKind::Float, Column::RawFloat(c)) => FeatureAccess::Raw(c),
                (FeatureKind::Categorical, Column::String(c)) => FeatureAccess::Categorical(c),
                (FeatureKind::Float, other) => {
                    return Err(mismatch(name, ColumnKind::BucketizedFloat, other));
                }
                (FeatureKind::Categorical, other) => {
                    return Err(mismatch(name, ColumnKind::String, other));
                }
            };
            features.push(access);
        }
        Ok(Self {
            features,
            n_rows: store.n_rows(),
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn feature(&self, index: u32) -> &FeatureAccess<'a> {
        &self.features[index as usize]
    }
}

fn mismatch(name: &str, expected: ColumnKind, found: &Column) -> Error {
    Error::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

// =============================================================================
// CompiledTree
// =============================================================================

#[derive(Debug, Clone)]
enum Rule {
    Float { threshold: f64, missing_to_right: bool },
    Categorical { left: CodeSet },
}

#[derive(Debug, Clone)]
enum CompiledNode {
    Leaf(f64),
    Branch {
        feature: u32,
        rule: Rule,
        left: NodeId,
        right: NodeId,
    },
}

/// A tree ready to score rows of one bound store.
#[derive(Debug, Clone)]
pub struct CompiledTree {
    nodes: Vec<CompiledNode>,
}

impl CompiledTree {
    /// Compile a tree against a binding.
    ///
    /// Category names unknown to a column's dictionary cannot occur in that
    /// column and are dropped from the compiled set.
    pub fn compile(tree: &Tree, binding: &ColumnBinding<'_>) -> Self {
        let nodes = tree
            .nodes()
            .iter()
            .map(|node| match node {
                Node::Leaf { score } => CompiledNode::Leaf(*score),
                Node::Branch {
                    split, left, right, ..
                } => {
                    let rule = match &split.condition {
                        SplitCondition::Float {
                            threshold,
                            missing_to_right,
                        } => Rule::Float {
                            threshold: *threshold,
                            missing_to_right: *missing_to_right,
                        },
                        SplitCondition::Categorical { categories } => {
                            let left = match binding.feature(split.feature) {
                                FeatureAccess::Categorical(column) => {
                                    let dictionary = column.dictionary();
                                    CodeSet::from_codes(categories.iter().filter_map(|c| dictionary.code_of(c)))
                                }
                                _ => CodeSet::default(),
                            };
                            Rule::Categorical { left }
                        }
                    };
                    CompiledNode::Branch {
                        feature: split.feature,
                        rule,
                        left: *left,
                        right: *right,
                    }
                }
            })
            .collect();
        Self { nodes }
    }

    /// Leaf score reached by `row`.
    #[inline]
    pub fn score(&self, binding: &ColumnBinding<'_>, row: usize) -> f64 {
        let mut id = 0usize;
        loop {
            match &self.nodes[id] {
                CompiledNode::Leaf(score) => return *score,
                CompiledNode::Branch {
                    feature,
                    rule,
                    left,
                    right,
                } => {
                    let access = binding.feature(*feature);
                    let goes_left = match rule {
                        Rule::Float {
                            threshold,
                            missing_to_right,
                        } => {
                            let value = access.value(row);
                            if value.is_nan() {
                                !missing_to_right
                            } else {
                                value < *threshold
                            }
                        }
                        Rule::Categorical { left } => left.contains(access.code(row)),
                    };
                    id = (if goes_left { *left } else { *right }) as usize;
                }
            }
        }
    }
}
