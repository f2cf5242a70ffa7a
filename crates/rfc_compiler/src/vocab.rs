//! Bag-of-words vocabulary
//!
//! Maps lowercase tokens to feature indices. Entries are kept sorted by
//! feature index; that order is also the row order of the generated feature
//! table, so the bucket layout never depends on map iteration order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{CompileError, Result};

/// One vocabulary term and its feature slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabEntry {
    pub term: String,
    pub index: usize,
}

/// Token → feature index table, ordered by feature index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct Vocabulary {
    entries: Vec<VocabEntry>,
}

impl Vocabulary {
    /// Build a vocabulary from `(term, index)` pairs in any order.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut entries: Vec<VocabEntry> = pairs
            .into_iter()
            .map(|(term, index)| VocabEntry {
                term: term.into(),
                index,
            })
            .collect();

        if entries.is_empty() {
            return Err(CompileError::EmptyVocabulary);
        }

        entries.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.term.cmp(&b.term)));

        for pair in entries.windows(2) {
            if pair[0].index == pair[1].index {
                return Err(CompileError::DuplicateVocabularyIndex {
                    index: pair[0].index,
                    first: pair[0].term.clone(),
                    second: pair[1].term.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Build a vocabulary from terms listed in feature-index order.
    pub fn from_feature_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_pairs(names.into_iter().enumerate().map(|(i, t)| (t, i)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending feature-index order.
    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    /// Smallest feature vector length that holds every index.
    pub fn feature_span(&self) -> usize {
        self.entries.last().map(|e| e.index + 1).unwrap_or(0)
    }

    /// Feature index of `term`, by linear scan (host-side convenience only).
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.term == term).map(|e| e.index)
    }

    /// Resolve the feature vector length.
    ///
    /// Defaults to the vocabulary span; a requested size must still cover
    /// every index.
    pub fn resolve_max_features(&self, requested: Option<usize>) -> Result<usize> {
        let span = self.feature_span();
        match requested {
            None => Ok(span),
            Some(max_features) if max_features >= span => Ok(max_features),
            Some(max_features) => Err(CompileError::FeatureIndexOutOfRange {
                index: span - 1,
                max_features,
            }),
        }
    }
}

impl TryFrom<BTreeMap<String, usize>> for Vocabulary {
    type Error = CompileError;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

impl From<Vocabulary> for BTreeMap<String, usize> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.entries.into_iter().map(|e| (e.term, e.index)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_sorted_by_index() {
        let vocab = Vocabulary::from_pairs([("post", 2), ("dropbox", 0), ("com", 1)]).unwrap();
        let terms: Vec<&str> = vocab.entries().iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["dropbox", "com", "post"]);
        assert_eq!(vocab.feature_span(), 3);
        assert_eq!(vocab.index_of("post"), Some(2));
        assert_eq!(vocab.index_of("get"), None);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = Vocabulary::from_pairs([("www", 4), ("api", 4)]).unwrap_err();
        match err {
            CompileError::DuplicateVocabularyIndex { index, first, second } => {
                assert_eq!(index, 4);
                assert_eq!(first, "api");
                assert_eq!(second, "www");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_rejected() {
        let pairs: Vec<(String, usize)> = Vec::new();
        assert!(matches!(
            Vocabulary::from_pairs(pairs),
            Err(CompileError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_resolve_max_features() {
        let vocab = Vocabulary::from_pairs([("a1", 0), ("b2", 6)]).unwrap();
        assert_eq!(vocab.resolve_max_features(None).unwrap(), 7);
        assert_eq!(vocab.resolve_max_features(Some(5000)).unwrap(), 5000);
        assert!(vocab.resolve_max_features(Some(6)).is_err());
    }

    #[test]
    fn test_json_map_round_trip() {
        let vocab: Vocabulary = serde_json::from_str(r#"{"upload": 1, "precheck": 0}"#).unwrap();
        assert_eq!(vocab.entries()[0].term, "precheck");
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"{"precheck":0,"upload":1}"#);
    }
}
