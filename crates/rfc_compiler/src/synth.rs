//! Seeded synthetic models
//!
//! Deterministic stand-ins for a trained bundle, used by tests, benches and
//! `rfc-compile --demo`. The same seed always yields the same bundle on
//! every platform.

use std::num::Wrapping;

use crate::bundle::{ModelBundle, TargetModel, TreeSpec};
use crate::errors::Result;
use crate::forest::{Node, Tree};
use crate::vocab::Vocabulary;

/// Linear congruential generator (glibc constants)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 1_103_515_245;
    const INCREMENT: u64 = 12_345;
    const MODULUS: u64 = 1 << 31;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed % Self::MODULUS),
        }
    }

    /// Next value in `[0, 2^31)`
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 % Self::MODULUS) as u32
    }

    /// Value in `[0, max)`; 0 when `max` is 0.
    pub fn next_below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        self.next_u32() as usize % max
    }
}

/// Terms of typical file-sharing traffic, always at the front of a
/// synthetic vocabulary.
pub const TRAFFIC_TERMS: &[&str] = &[
    "www", "dropbox", "com", "cmd", "upload", "precheck", "post", "get", "https", "application",
    "json", "text", "plain", "charset", "utf", "20charset", "html", "box", "api", "drive",
    "google", "onedrive", "live", "files", "download", "login", "oauth2", "token", "xml",
    "javascript", "octet", "stream", "content", "v2", "share", "folder", "wetransfer", "mega",
];

pub const SERVICE_LABELS: &[&str] = &[
    "Box",
    "Dropbox",
    "Google Drive",
    "MEGA",
    "OneDrive",
    "WeTransfer",
];

pub const ACTIVITY_LABELS: &[&str] = &["Download", "Login", "Share", "Upload"];

/// Shape of a synthetic bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthSpec {
    /// Total vocabulary size (at least the traffic terms)
    pub vocabulary_size: usize,
    pub trees_per_target: usize,
    pub max_depth: usize,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            vocabulary_size: TRAFFIC_TERMS.len(),
            trees_per_target: 5,
            max_depth: 6,
        }
    }
}

/// Traffic terms followed by `term{i}` fillers, indexed in order.
pub fn synthetic_vocabulary(size: usize) -> Result<Vocabulary> {
    let terms = TRAFFIC_TERMS
        .iter()
        .map(|t| t.to_string())
        .chain((TRAFFIC_TERMS.len()..).map(|i| format!("term{i}")))
        .take(size.max(TRAFFIC_TERMS.len()));
    Vocabulary::from_feature_names(terms)
}

/// Random binary-split tree in preorder layout.
///
/// Splits use threshold 0.5 and never test the same feature twice on one
/// path, so every leaf is reachable by some binary feature vector.
pub fn random_tree(
    rng: &mut LcgRng,
    num_features: usize,
    num_classes: usize,
    max_depth: usize,
) -> Tree {
    let mut nodes = Vec::new();
    let mut used = Vec::new();
    grow(rng, &mut nodes, &mut used, num_features, num_classes, max_depth);
    Tree::new(nodes)
}

fn grow(
    rng: &mut LcgRng,
    nodes: &mut Vec<Node>,
    used: &mut Vec<usize>,
    num_features: usize,
    num_classes: usize,
    depth_left: usize,
) -> usize {
    let idx = nodes.len();
    // Leaves become more likely further down
    let make_leaf = depth_left == 0
        || used.len() >= num_features
        || (idx > 0 && rng.next_below(4) == 0);
    if make_leaf {
        nodes.push(Node::leaf(rng.next_below(num_classes)));
        return idx;
    }

    let mut feature = rng.next_below(num_features);
    while used.contains(&feature) {
        feature = (feature + 1) % num_features;
    }

    nodes.push(Node::leaf(0));
    used.push(feature);
    let left = grow(rng, nodes, used, num_features, num_classes, depth_left - 1);
    let right = grow(rng, nodes, used, num_features, num_classes, depth_left - 1);
    used.pop();

    nodes[idx] = Node::internal(feature, 0.5, left, right);
    idx
}

fn target_model(
    rng: &mut LcgRng,
    labels: &[&str],
    spec: &SynthSpec,
    num_features: usize,
) -> TargetModel {
    let trees = (0..spec.trees_per_target)
        .map(|_| TreeSpec::Arena(random_tree(rng, num_features, labels.len(), spec.max_depth)))
        .collect();
    TargetModel {
        num_classes: None,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        trees,
    }
}

/// Deterministic bundle for `seed`.
pub fn synthetic_bundle(seed: u64, spec: &SynthSpec) -> Result<ModelBundle> {
    let mut rng = LcgRng::new(seed);
    let vocabulary = synthetic_vocabulary(spec.vocabulary_size)?;
    let num_features = vocabulary.len();
    // Bias splits toward the traffic terms so real requests reach deep nodes
    let split_features = num_features.min(TRAFFIC_TERMS.len());
    Ok(ModelBundle {
        service: target_model(&mut rng, SERVICE_LABELS, spec, split_features),
        activity: target_model(&mut rng, ACTIVITY_LABELS, spec, split_features),
        vocabulary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = LcgRng::new(42);
        let mut b = LcgRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert_eq!(LcgRng::new(7).next_below(0), 0);
    }

    #[test]
    fn test_random_trees_are_valid() {
        let mut rng = LcgRng::new(1);
        for _ in 0..50 {
            let tree = random_tree(&mut rng, 8, 3, 5);
            assert!(tree.validate().is_ok());
            assert!(tree.max_feature_index().map_or(true, |f| f < 8));
            assert!(tree.leaf_classes().all(|c| c < 3));
        }
    }

    #[test]
    fn test_bundle_is_deterministic() {
        let spec = SynthSpec::default();
        let a = synthetic_bundle(2024, &spec).unwrap();
        let b = synthetic_bundle(2024, &spec).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.target(Target::Service).trees.len(), 5);
        assert!(a.ensembles().is_ok());
        assert_eq!(a.vocabulary.index_of("www"), Some(0));
    }

    #[test]
    fn test_vocabulary_fillers() {
        let vocab = synthetic_vocabulary(100).unwrap();
        assert_eq!(vocab.len(), 100);
        assert_eq!(vocab.index_of("term99"), Some(99));
    }
}
