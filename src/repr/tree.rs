//! Regression tree stored as a node arena.
//!
//! Node 0 is the root. Branches refer to their children by index, so a tree is
//! a flat `Vec` that is cheap to clone, walk and serialize.

use super::NodeId;

// =============================================================================
// Split
// =============================================================================

/// Routing rule of a branch.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitCondition {
    /// Rows with `value < threshold` go left. Missing rows go left unless
    /// `missing_to_right`.
    Float { threshold: f64, missing_to_right: bool },
    /// Rows whose category is listed go left; every other category, known or
    /// not, goes right. Missing participates as `__missing__`.
    Categorical { categories: Vec<String> },
}

/// A branch's split: feature index, gain and routing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Index into the forest's [`FeatureTable`](super::FeatureTable).
    pub feature: u32,
    /// Loss reduction achieved by the split.
    pub gain: f64,
    pub condition: SplitCondition,
}

// =============================================================================
// Node
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        score: f64,
    },
    Branch {
        split: Split,
        left: NodeId,
        right: NodeId,
        /// Score the node would have as a leaf.
        score: f64,
    },
}

impl Node {
    #[inline]
    pub fn score(&self) -> f64 {
        match self {
            Self::Leaf { score } | Self::Branch { score, .. } => *score,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    EmptyTree,
    ChildOutOfBounds { node: NodeId, child: NodeId, n_nodes: usize },
    /// A node is reachable twice (shared child or cycle).
    DuplicateVisit { node: NodeId },
    /// A node is not reachable from the root.
    Unreachable { node: NodeId },
}

impl std::fmt::Display for TreeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTree => write!(f, "tree has no nodes"),
            Self::ChildOutOfBounds { node, child, n_nodes } => {
                write!(f, "node {node} points to child {child} but the tree has {n_nodes} nodes")
            }
            Self::DuplicateVisit { node } => write!(f, "node {node} is reachable more than once"),
            Self::Unreachable { node } => write!(f, "node {node} is not reachable from the root"),
        }
    }
}

impl std::error::Error for TreeValidationError {}

// =============================================================================
// Tree
// =============================================================================

/// Immutable regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Tree with a single leaf.
    pub fn leaf(score: f64) -> Self {
        Self {
            nodes: vec![Node::Leaf { score }],
        }
    }

    /// Wrap nodes, checking that they form a proper binary tree rooted at 0.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeValidationError> {
        let tree = Self { nodes };
        tree.validate()?;
        Ok(tree)
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Branch splits in node order.
    pub fn splits(&self) -> impl Iterator<Item = &Split> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Branch { split, .. } => Some(split),
            Node::Leaf { .. } => None,
        })
    }

    /// Multiply every node score by `factor`.
    pub fn scale_scores(&mut self, factor: f64) {
        for node in &mut self.nodes {
            match node {
                Node::Leaf { score } | Node::Branch { score, .. } => *score *= factor,
            }
        }
    }

    /// Rewrite every split's feature index, e.g. after the feature table of
    /// the owning forest changed.
    pub fn remap_features(&mut self, mut map: impl FnMut(u32) -> u32) {
        for node in &mut self.nodes {
            if let Node::Branch { split, .. } = node {
                split.feature = map(split.feature);
            }
        }
    }

    /// Check that every node is reachable exactly once from the root.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        let mut visited = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![0];
        while let Some(node) = stack.pop() {
            if visited[node as usize] {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            visited[node as usize] = true;
            if let Node::Branch { left, right, .. } = &self.nodes[node as usize] {
                for &child in [right, left] {
                    if child as usize >= n_nodes {
                        return Err(TreeValidationError::ChildOutOfBounds {
                            node,
                            child,
                            n_nodes,
                        });
                    }
                    stack.push(child);
                }
            }
        }
        if let Some(node) = visited.iter().position(|&v| !v) {
            return Err(TreeValidationError::Unreachable { node: node as NodeId });
        }
        Ok(())
    }
}

// =============================================================================
// MutableTree
// =============================================================================

/// Tree under construction.
///
/// Starts as a single root leaf; [`split_leaf`](Self::split_leaf) turns a leaf
/// into a branch and appends its two children, so node ids follow creation
/// order.
#[derive(Debug, Clone)]
pub struct MutableTree {
    nodes: Vec<Node>,
}

impl MutableTree {
    pub fn new(root_score: f64) -> Self {
        Self {
            nodes: vec![Node::Leaf { score: root_score }],
        }
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Replace a leaf with a branch and return `(left, right)` child ids.
    ///
    /// The branch keeps the leaf's score.
    pub fn split_leaf(&mut self, node: NodeId, split: Split, left_score: f64, right_score: f64) -> (NodeId, NodeId) {
        let left = self.nodes.len() as NodeId;
        let right = left + 1;
        let score = self.nodes[node as usize].score();
        debug_assert!(self.nodes[node as usize].is_leaf(), "only leaves can be split");
        self.nodes[node as usize] = Node::Branch {
            split,
            left,
            right,
            score,
        };
        self.nodes.push(Node::Leaf { score: left_score });
        self.nodes.push(Node::Leaf { score: right_score });
        (left, right)
    }

    pub fn freeze(self) -> Tree {
        Tree { nodes: self.nodes }
    }
}
