//! Import of the parallel-array tree layout exported by the training library
//!
//! A fitted estimator exposes each tree as parallel arrays indexed by node
//! id. Leaves have `children_left == -1`; their class is the argmax of the
//! per-class `value` row, with ties going to the lowest class id.

use serde::{Deserialize, Serialize};

use super::tree::{Node, Tree};

/// Child id marking a leaf.
pub const TREE_LEAF: i64 = -1;

/// Parallel node arrays of one fitted tree (single-output classifier).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SklearnTreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights or counts, one row per node
    pub value: Vec<Vec<f64>>,
}

/// Index of the largest value; the first maximum wins.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, current)) if v <= current => {}
            _ if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

impl SklearnTreeArrays {
    /// Number of nodes described by the arrays.
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Convert the arrays into an arena tree.
    pub fn to_tree(&self) -> Result<Tree, String> {
        let n = self.node_count();
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!(
                "array lengths differ: children_left={}, children_right={}, feature={}, threshold={}, value={}",
                n,
                self.children_right.len(),
                self.feature.len(),
                self.threshold.len(),
                self.value.len()
            ));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            if self.children_left[i] == TREE_LEAF {
                let class_id = argmax(&self.value[i])
                    .ok_or_else(|| format!("Leaf {i} has no class values"))?;
                nodes.push(Node::leaf(class_id));
                continue;
            }

            let child = |raw: i64, side: &str| {
                usize::try_from(raw).map_err(|_| format!("Node {i} has invalid {side} child: {raw}"))
            };
            let feature_index = usize::try_from(self.feature[i])
                .map_err(|_| format!("Node {i} has invalid feature index: {}", self.feature[i]))?;

            nodes.push(Node::internal(
                feature_index,
                self.threshold[i],
                child(self.children_left[i], "left")?,
                child(self.children_right[i], "right")?,
            ));
        }

        let tree = Tree::new(nodes);
        tree.validate()?;
        Ok(tree)
    }
}
