//! Intermediate form of the generated translation unit
//!
//! Lowering turns validated ensembles into these items; rendering prints
//! them in one pass. Every item can also be evaluated in Rust, so the logic
//! that ends up in C is testable without a C toolchain.

use std::collections::HashMap;

use crate::forest::{select_by_vote, Node, Tree};
use crate::hash_table::HashTable;
use crate::predictor::PredictedIds;
use crate::request::FIELD_COUNT;
use crate::target::Target;
use crate::tokenizer::{extract_features, FeatureVector};

/// Statement inside a tree function body
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `if (features[i] <= t) { .. } else { .. }`
    If {
        feature_index: usize,
        /// Threshold exactly as printed (rounded to 6 decimals)
        threshold: f64,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
    },
    /// `return class_id; // label`
    Return {
        class_id: usize,
        label: Option<String>,
    },
}

/// Round a threshold the way it is printed into the source.
pub fn printed_threshold(threshold: f64) -> f64 {
    format!("{threshold:.6}").parse().unwrap_or(threshold)
}

impl Stmt {
    /// Lower a validated tree arena into nested statements.
    ///
    /// `label_of` supplies the comment for each leaf.
    pub fn from_tree<F>(tree: &Tree, label_of: &F) -> Option<Stmt>
    where
        F: Fn(usize) -> Option<String>,
    {
        Self::from_node(tree, 0, label_of)
    }

    fn from_node<F>(tree: &Tree, idx: usize, label_of: &F) -> Option<Stmt>
    where
        F: Fn(usize) -> Option<String>,
    {
        match tree.nodes.get(idx)? {
            Node::Leaf { class_id } => Some(Stmt::Return {
                class_id: *class_id,
                label: label_of(*class_id),
            }),
            Node::Internal {
                feature_index,
                threshold,
                left,
                right,
            } => {
                // Forward-only children keep this recursion finite
                if *left <= idx || *right <= idx {
                    return None;
                }
                Some(Stmt::If {
                    feature_index: *feature_index,
                    threshold: printed_threshold(*threshold),
                    then_branch: Box::new(Self::from_node(tree, *left, label_of)?),
                    else_branch: Box::new(Self::from_node(tree, *right, label_of)?),
                })
            }
        }
    }

    /// Execute the statement against a binary feature vector.
    pub fn eval(&self, features: &[u8]) -> usize {
        let mut stmt = self;
        loop {
            match stmt {
                Stmt::Return { class_id, .. } => return *class_id,
                Stmt::If {
                    feature_index,
                    threshold,
                    then_branch,
                    else_branch,
                } => {
                    let value = f64::from(features.get(*feature_index).copied().unwrap_or(0));
                    stmt = if value <= *threshold {
                        then_branch
                    } else {
                        else_branch
                    };
                }
            }
        }
    }

    /// Nesting depth (a lone return is depth 1).
    pub fn depth(&self) -> usize {
        match self {
            Stmt::Return { .. } => 1,
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => 1 + then_branch.depth().max(else_branch.depth()),
        }
    }
}

/// `static int {target}_tree_{index}(const float features[MAX_FEATURES])`
#[derive(Debug, Clone, PartialEq)]
pub struct TreeFunction {
    pub target: Target,
    pub index: usize,
    pub body: Stmt,
}

impl TreeFunction {
    pub fn name(&self) -> String {
        format!("{}_tree_{}", self.target.name(), self.index)
    }
}

/// `static int predict_{target}(const float features[MAX_FEATURES])`
#[derive(Debug, Clone, PartialEq)]
pub struct VoteFunction {
    pub target: Target,
    pub num_classes: usize,
    /// Called tree functions, in vote order
    pub trees: Vec<String>,
}

impl VoteFunction {
    pub fn name(&self) -> String {
        format!("predict_{}", self.target.name())
    }
}

/// Top-level function in the translation unit
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Tree(TreeFunction),
    Vote(VoteFunction),
}

/// Everything the renderer needs to print `api_classifier.c`
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub max_features: usize,
    pub table: HashTable,
    pub items: Vec<Item>,
}

impl TranslationUnit {
    pub fn tree_functions(&self, target: Target) -> impl Iterator<Item = &TreeFunction> + '_ {
        self.items.iter().filter_map(move |item| match item {
            Item::Tree(f) if f.target == target => Some(f),
            _ => None,
        })
    }

    pub fn vote_function(&self, target: Target) -> Option<&VoteFunction> {
        self.items.iter().find_map(|item| match item {
            Item::Vote(f) if f.target == target => Some(f),
            _ => None,
        })
    }

    /// Run the generated tokenizer and hash lookup.
    pub fn features(&self, inputs: &[Option<&str>; FIELD_COUNT]) -> FeatureVector {
        extract_features(inputs, &self.table, self.max_features)
    }

    /// Run `predict_{target}` against a feature vector.
    ///
    /// A vote for a class outside the vote array is dropped; lowering never
    /// produces one.
    pub fn predict_target(&self, target: Target, features: &[u8]) -> usize {
        let Some(vote) = self.vote_function(target) else {
            return 0;
        };
        let bodies: HashMap<String, &Stmt> = self
            .tree_functions(target)
            .map(|f| (f.name(), &f.body))
            .collect();

        let mut votes = vec![0u32; vote.num_classes];
        for name in &vote.trees {
            if let Some(body) = bodies.get(name) {
                if let Some(slot) = votes.get_mut(body.eval(features)) {
                    *slot += 1;
                }
            }
        }
        select_by_vote(&votes)
    }

    /// What `main` prints for these positional inputs.
    pub fn predict(&self, inputs: &[Option<&str>; FIELD_COUNT]) -> PredictedIds {
        let features = self.features(inputs);
        PredictedIds {
            service_id: self.predict_target(Target::Service, features.as_slice()),
            activity_id: self.predict_target(Target::Activity, features.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Tree {
        Tree::new(vec![
            Node::internal(2, 0.5, 1, 2),
            Node::leaf(0),
            Node::internal(0, 0.5, 3, 4),
            Node::leaf(1),
            Node::leaf(2),
        ])
    }

    #[test]
    fn test_lowering_matches_arena_walk() {
        let tree = sample_tree();
        let stmt = Stmt::from_tree(&tree, &|c| Some(format!("class {c}"))).unwrap();
        assert_eq!(stmt.depth(), 3);
        for features in [[0u8, 0, 0], [0, 0, 1], [1, 0, 1], [1, 1, 0]] {
            assert_eq!(Some(stmt.eval(&features)), tree.evaluate(&features));
        }
    }

    #[test]
    fn test_backward_reference_refused() {
        let tree = Tree::new(vec![Node::internal(0, 0.5, 0, 1), Node::leaf(0)]);
        assert!(Stmt::from_tree(&tree, &|_| None).is_none());
    }

    #[test]
    fn test_printed_threshold() {
        assert_eq!(printed_threshold(0.5), 0.5);
        assert_eq!(printed_threshold(0.123_456_789), 0.123_457);
        assert_eq!(printed_threshold(0.999_999_9), 1.0);
    }
}
