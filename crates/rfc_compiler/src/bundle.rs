//! Model bundle: the compiler's input file
//!
//! A JSON document holding the vocabulary plus, for each target, the label
//! encoder classes and the fitted trees. Trees may be given as node arenas
//! (`{"nodes": [...]}`) or as the training library's parallel arrays.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::canon::hash_canonical_hex;
use crate::errors::{CompileError, Result};
use crate::forest::{Ensemble, Ensembles, SklearnTreeArrays, Tree};
use crate::labels::{LabelMap, LabelMaps};
use crate::target::Target;
use crate::vocab::Vocabulary;

/// One tree in either supported layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeSpec {
    Arena(Tree),
    Sklearn(SklearnTreeArrays),
}

impl TreeSpec {
    pub fn to_tree(&self) -> std::result::Result<Tree, String> {
        match self {
            TreeSpec::Arena(tree) => Ok(tree.clone()),
            TreeSpec::Sklearn(arrays) => arrays.to_tree(),
        }
    }
}

/// Labels and trees for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetModel {
    /// Vote array size; defaults to the number of labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_classes: Option<usize>,
    /// Label encoder classes, indexed by class id
    pub labels: Vec<String>,
    pub trees: Vec<TreeSpec>,
}

impl TargetModel {
    pub fn num_classes(&self) -> usize {
        self.num_classes.unwrap_or(self.labels.len())
    }

    fn ensemble(&self, target: Target) -> Result<Ensemble> {
        let trees = self
            .trees
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                spec.to_tree()
                    .map_err(|reason| CompileError::InvalidTree {
                        target,
                        tree: i,
                        reason,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Ensemble::new(trees, self.num_classes()))
    }
}

/// Everything needed to compile a predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub vocabulary: Vocabulary,
    pub service: TargetModel,
    pub activity: TargetModel,
}

impl ModelBundle {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bundle: Self = serde_json::from_slice(&fs::read(path)?)?;
        info!(
            "Loaded model bundle from {}: {} terms, {} service trees, {} activity trees",
            path.display(),
            bundle.vocabulary.len(),
            bundle.service.trees.len(),
            bundle.activity.trees.len()
        );
        Ok(bundle)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn target(&self, target: Target) -> &TargetModel {
        match target {
            Target::Service => &self.service,
            Target::Activity => &self.activity,
        }
    }

    /// Convert every tree into an arena.
    pub fn ensembles(&self) -> Result<Ensembles> {
        Ok(Ensembles {
            service: self.service.ensemble(Target::Service)?,
            activity: self.activity.ensemble(Target::Activity)?,
        })
    }

    pub fn label_maps(&self) -> LabelMaps {
        LabelMaps {
            service: LabelMap::from_classes(self.service.labels.iter().cloned()),
            activity: LabelMap::from_classes(self.activity.labels.iter().cloned()),
        }
    }

    /// BLAKE3 of the canonical JSON form, independent of key order.
    pub fn hash_hex(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }
}
