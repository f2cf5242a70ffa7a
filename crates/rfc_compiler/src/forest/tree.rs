//! Decision tree arena for forest classifiers
//!
//! Nodes live in a flat vector addressed by index; node 0 is the root.
//! Valid trees only reference children at larger indices, so a tree that
//! passes [`Tree::validate`] can never contain a cycle.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal split or class leaf)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Binary split: go left when `features[feature_index] <= threshold`
    Internal {
        feature_index: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal vote for one class
    Leaf { class_id: usize },
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(feature_index: usize, threshold: f64, left: usize, right: usize) -> Self {
        Node::Internal {
            feature_index,
            threshold,
            left,
            right,
        }
    }

    /// Create a new leaf node
    pub fn leaf(class_id: usize) -> Self {
        Node::Leaf { class_id }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// A single classification tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Get the root node
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Index of the leaf reached by `features`.
    ///
    /// Feature slots past the end of `features` read as 0, which is what the
    /// zero-initialised vector in generated code holds for them.
    pub fn leaf_index(&self, features: &[u8]) -> Option<usize> {
        let mut idx = 0usize;
        // A forward-only arena is walked in at most `nodes.len()` steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx)? {
                Node::Leaf { .. } => return Some(idx),
                Node::Internal {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    let value = f64::from(features.get(*feature_index).copied().unwrap_or(0));
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
        None
    }

    /// Evaluate this tree on a binary feature vector, returning the class id.
    pub fn evaluate(&self, features: &[u8]) -> Option<usize> {
        match self.nodes.get(self.leaf_index(features)?)? {
            Node::Leaf { class_id } => Some(*class_id),
            Node::Internal { .. } => None,
        }
    }

    /// Class ids of every leaf, in arena order.
    pub fn leaf_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            Node::Leaf { class_id } => Some(*class_id),
            Node::Internal { .. } => None,
        })
    }

    /// Largest feature index referenced by a split, if any.
    pub fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Internal { feature_index, .. } => Some(*feature_index),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    /// Longest root-to-leaf path, counting nodes (a lone leaf is 1).
    ///
    /// Computed in one forward pass, so it needs forward-only children but
    /// no recursion.
    pub fn depth(&self) -> usize {
        let mut depth = vec![0usize; self.nodes.len()];
        if let Some(root) = depth.first_mut() {
            *root = 1;
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if depth[i] == 0 {
                continue;
            }
            if let Node::Internal { left, right, .. } = node {
                for child in [*left, *right] {
                    if child > i && child < depth.len() {
                        depth[child] = depth[child].max(depth[i] + 1);
                    }
                }
            }
        }
        depth.into_iter().max().unwrap_or(0)
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        let mut parents = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Internal {
                threshold,
                left,
                right,
                ..
            } = node
            {
                if !threshold.is_finite() {
                    return Err(format!("Node {i} has non-finite threshold {threshold}"));
                }
                for (side, child) in [("left", *left), ("right", *right)] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("Node {i} has invalid {side} child: {child}"));
                    }
                    parents[child] += 1;
                }
            }
        }

        if let Some(orphan) = (1..self.nodes.len()).find(|&i| parents[i] != 1) {
            return Err(format!(
                "Node {orphan} is referenced {} times (expected exactly once)",
                parents[orphan]
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        // if feature[0] <= 0.5 -> class 1, else class 2
        Tree::new(vec![
            Node::internal(0, 0.5, 1, 2),
            Node::leaf(1),
            Node::leaf(2),
        ])
    }

    #[test]
    fn test_depth() {
        assert_eq!(Tree::new(vec![Node::leaf(0)]).depth(), 1);
        let tree = Tree::new(vec![
            Node::internal(0, 0.5, 1, 2),
            Node::leaf(0),
            Node::internal(1, 0.5, 3, 4),
            Node::leaf(1),
            Node::leaf(0),
        ]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(Tree::new(Vec::new()).depth(), 0);
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(3, 0.5, 1, 2);
        assert!(!internal.is_leaf());
        assert!(Node::leaf(4).is_leaf());
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0]), Some(1));
        assert_eq!(tree.evaluate(&[1]), Some(2));
        // Missing slots read as absent features
        assert_eq!(tree.evaluate(&[]), Some(1));
    }

    #[test]
    fn test_threshold_equality_goes_left() {
        let tree = Tree::new(vec![
            Node::internal(0, 1.0, 1, 2),
            Node::leaf(0),
            Node::leaf(1),
        ]);
        assert_eq!(tree.evaluate(&[1]), Some(0));
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = Tree::new(vec![Node::leaf(7)]);
        assert!(tree.validate().is_ok());
        assert_eq!(tree.evaluate(&[1, 1, 1]), Some(7));
        assert_eq!(tree.max_feature_index(), None);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate().is_ok());
        assert!(Tree::new(vec![]).validate().is_err());

        // left child out of bounds
        let out_of_bounds = Tree::new(vec![
            Node::internal(0, 0.5, 5, 2),
            Node::leaf(1),
            Node::leaf(2),
        ]);
        assert!(out_of_bounds.validate().is_err());

        // backwards reference would allow a cycle
        let cyclic = Tree::new(vec![
            Node::internal(0, 0.5, 1, 2),
            Node::internal(1, 0.5, 0, 2),
            Node::leaf(2),
        ]);
        assert!(cyclic.validate().is_err());

        // node 2 shared by two parents, node 3 orphaned
        let shared = Tree::new(vec![
            Node::internal(0, 0.5, 1, 2),
            Node::internal(1, 0.5, 2, 4),
            Node::leaf(0),
            Node::leaf(1),
            Node::leaf(2),
        ]);
        assert!(shared.validate().is_err());

        let nan = Tree::new(vec![
            Node::internal(0, f64::NAN, 1, 2),
            Node::leaf(0),
            Node::leaf(1),
        ]);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_leaf_classes_and_features() {
        let tree = Tree::new(vec![
            Node::internal(4, 0.5, 1, 2),
            Node::leaf(3),
            Node::internal(9, 0.5, 3, 4),
            Node::leaf(0),
            Node::leaf(3),
        ]);
        assert_eq!(tree.leaf_classes().collect::<Vec<_>>(), vec![3, 0, 3]);
        assert_eq!(tree.max_feature_index(), Some(9));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&stump()).unwrap();
        assert!(json.contains(r#""kind":"internal""#));
        assert!(json.contains(r#""kind":"leaf","class_id":1"#));
        let back: Tree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stump());
    }
}
