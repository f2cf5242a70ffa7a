//! Forest → C compiler
//!
//! [`lower`] validates the inputs and builds a [`TranslationUnit`];
//! [`render`] prints it. [`compile`] does both.

pub mod ast;
pub mod render;
pub mod templates;

pub use ast::{printed_threshold, Item, Stmt, TranslationUnit, TreeFunction, VoteFunction};
pub use render::{c_string_literal, comment_text, render};

use tracing::{debug, warn};

use crate::errors::{CompileError, Result};
use crate::forest::{Ensemble, Ensembles, Node, Tree};
use crate::hash_table::HashTable;
use crate::labels::{LabelMap, LabelMaps};
use crate::target::Target;
use crate::vocab::Vocabulary;

/// Deepest tree the compiler accepts. Lowering, rendering and the nested C
/// blocks all grow with depth.
pub const MAX_TREE_DEPTH: usize = 1024;

/// Validate inputs and lower both ensembles.
///
/// `max_features` defaults to the vocabulary span.
pub fn lower(
    ensembles: &Ensembles,
    vocabulary: &Vocabulary,
    labels: &LabelMaps,
    max_features: Option<usize>,
) -> Result<TranslationUnit> {
    let max_features = vocabulary.resolve_max_features(max_features)?;
    let table = HashTable::build(vocabulary)?;

    let mut items = Vec::new();
    for target in Target::ALL {
        lower_target(
            target,
            ensembles.get(target),
            labels.get(target),
            max_features,
            &mut items,
        )?;
    }

    Ok(TranslationUnit {
        max_features,
        table,
        items,
    })
}

fn lower_target(
    target: Target,
    ensemble: &Ensemble,
    labels: &LabelMap,
    max_features: usize,
    items: &mut Vec<Item>,
) -> Result<()> {
    ensemble.validate(target, max_features)?;

    if let Some(class_id) = ensemble
        .reachable_classes()
        .into_iter()
        .find(|&c| !labels.contains(c))
    {
        return Err(CompileError::MissingLabel { target, class_id });
    }

    let label_of = |class_id: usize| labels.get(class_id).map(str::to_string);
    let mut names = Vec::with_capacity(ensemble.num_trees());

    for (index, tree) in ensemble.trees.iter().enumerate() {
        let depth = tree.depth();
        if depth > MAX_TREE_DEPTH {
            return Err(CompileError::InvalidTree {
                target,
                tree: index,
                reason: format!("depth {depth} exceeds the limit of {MAX_TREE_DEPTH}"),
            });
        }
        warn_on_rounded_thresholds(target, index, tree);
        let body = Stmt::from_tree(tree, &label_of).ok_or_else(|| CompileError::InvalidTree {
            target,
            tree: index,
            reason: "tree could not be lowered".to_string(),
        })?;
        debug!("Lowered {}_tree_{} (depth {})", target, index, body.depth());

        let function = TreeFunction {
            target,
            index,
            body,
        };
        names.push(function.name());
        items.push(Item::Tree(function));
    }

    items.push(Item::Vote(VoteFunction {
        target,
        num_classes: ensemble.num_classes,
        trees: names,
    }));
    Ok(())
}

/// Warn when printing a threshold at 6 decimals flips a binary decision.
fn warn_on_rounded_thresholds(target: Target, index: usize, tree: &Tree) {
    for node in &tree.nodes {
        if let Node::Internal { threshold, .. } = node {
            let printed = printed_threshold(*threshold);
            if (0.0 <= *threshold) != (0.0 <= printed) || (1.0 <= *threshold) != (1.0 <= printed) {
                warn!(
                    "{}_tree_{}: threshold {} prints as {:.6} and changes a decision",
                    target, index, threshold, printed
                );
            }
        }
    }
}

/// Compile both ensembles into a complete C translation unit.
pub fn compile(
    ensembles: &Ensembles,
    vocabulary: &Vocabulary,
    labels: &LabelMaps,
    max_features: Option<usize>,
) -> Result<String> {
    Ok(render(&lower(ensembles, vocabulary, labels, max_features)?))
}
