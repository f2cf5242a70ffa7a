//! Majority-vote ensembles of classification trees

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::tree::Tree;
use crate::errors::{CompileError, Result};
use crate::target::Target;

/// Independently voting trees for one classification target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ensemble {
    pub trees: Vec<Tree>,
    pub num_classes: usize,
}

/// Pick the winning class from a vote array.
///
/// Scans ascending and only replaces the leader on a strictly greater count,
/// so the lowest class id wins every tie. An all-zero array selects 0.
pub fn select_by_vote(votes: &[u32]) -> usize {
    let mut max_votes = 0u32;
    let mut predicted = 0usize;
    for (class_id, &count) in votes.iter().enumerate() {
        if count > max_votes {
            max_votes = count;
            predicted = class_id;
        }
    }
    predicted
}

impl Ensemble {
    pub fn new(trees: Vec<Tree>, num_classes: usize) -> Self {
        Self { trees, num_classes }
    }

    /// Number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Check structure, feature bounds and class bounds for `target`.
    pub fn validate(&self, target: Target, max_features: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(CompileError::EmptyEnsemble(target));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|reason| CompileError::InvalidTree {
                target,
                tree: i,
                reason,
            })?;

            if let Some(index) = tree.max_feature_index() {
                if index >= max_features {
                    return Err(CompileError::FeatureIndexOutOfRange {
                        index,
                        max_features,
                    });
                }
            }

            if let Some(class_id) = tree.leaf_classes().find(|&c| c >= self.num_classes) {
                return Err(CompileError::ClassOutOfRange {
                    target,
                    tree: i,
                    class_id,
                    num_classes: self.num_classes,
                });
            }
        }

        Ok(())
    }

    /// Every class id some leaf can return.
    pub fn reachable_classes(&self) -> BTreeSet<usize> {
        self.trees.iter().flat_map(Tree::leaf_classes).collect()
    }

    /// One vote per tree, counted per class.
    pub fn votes(&self, features: &[u8]) -> Vec<u32> {
        let mut votes = vec![0u32; self.num_classes];
        for tree in &self.trees {
            if let Some(slot) = tree.evaluate(features).and_then(|c| votes.get_mut(c)) {
                *slot += 1;
            }
        }
        votes
    }

    /// Majority-vote prediction with lowest-id tie-break.
    pub fn predict(&self, features: &[u8]) -> usize {
        select_by_vote(&self.votes(features))
    }
}
