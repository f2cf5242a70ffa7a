//! Static vocabulary hash table
//!
//! Reproduces the lookup emitted into generated code: a feature table of
//! `(term, feature_index)` rows plus `HASH_TABLE_SIZE` fixed-capacity buckets
//! of row indices. Slots are chosen by 32-bit FNV-1a over the term's UTF-8
//! bytes. A bucket that would exceed `BUCKET_CAPACITY` fails the build.

use heapless::Vec as BucketVec;
use tracing::{debug, warn};

use crate::errors::{CompileError, Result};
use crate::tokenizer::is_reachable_term;
use crate::vocab::Vocabulary;

/// Number of hash slots (power of two)
pub const HASH_TABLE_SIZE: usize = 8192;

/// Maximum rows per slot
pub const BUCKET_CAPACITY: usize = 10;

/// FNV-1a 32-bit offset basis
pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime
pub const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a hash.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash slot of `term`.
pub fn bucket_of(term: &str) -> usize {
    fnv1a(term.as_bytes()) as usize % HASH_TABLE_SIZE
}

/// One row of the generated feature table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub term: String,
    pub feature_index: usize,
}

/// Row indices sharing one hash slot
pub type Bucket = BucketVec<u32, BUCKET_CAPACITY>;

/// Occupancy summary, logged after a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub rows: usize,
    pub used_buckets: usize,
    pub longest_bucket: usize,
}

/// Feature table plus bucket array
#[derive(Debug, Clone)]
pub struct HashTable {
    rows: Vec<FeatureRow>,
    buckets: Vec<Bucket>,
}

impl HashTable {
    /// Build the table, inserting rows in vocabulary (feature-index) order.
    pub fn build(vocabulary: &Vocabulary) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(CompileError::EmptyVocabulary);
        }

        let mut rows = Vec::with_capacity(vocabulary.len());
        let mut buckets = vec![Bucket::new(); HASH_TABLE_SIZE];

        for (row, entry) in vocabulary.entries().iter().enumerate() {
            if !is_reachable_term(&entry.term) {
                warn!(
                    "Vocabulary term {:?} (feature {}) can never be produced by the tokenizer",
                    entry.term, entry.index
                );
            }

            let slot = bucket_of(&entry.term);
            let row_id = u32::try_from(row).map_err(|_| CompileError::HashBucketOverflow {
                bucket: slot,
                capacity: BUCKET_CAPACITY,
                term: entry.term.clone(),
            })?;

            buckets[slot]
                .push(row_id)
                .map_err(|_| CompileError::HashBucketOverflow {
                    bucket: slot,
                    capacity: BUCKET_CAPACITY,
                    term: entry.term.clone(),
                })?;

            rows.push(FeatureRow {
                term: entry.term.clone(),
                feature_index: entry.index,
            });
        }

        let table = Self { rows, buckets };
        let stats = table.stats();
        debug!(
            "Hash table built: {} rows in {} buckets (longest bucket {})",
            stats.rows, stats.used_buckets, stats.longest_bucket
        );
        Ok(table)
    }

    /// Feature index of `term`, scanning only its bucket.
    pub fn find(&self, term: &str) -> Option<usize> {
        self.buckets[bucket_of(term)]
            .iter()
            .map(|&row| &self.rows[row as usize])
            .find(|row| row.term.as_bytes() == term.as_bytes())
            .map(|row| row.feature_index)
    }

    /// Feature table rows in emission order.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// All `HASH_TABLE_SIZE` buckets.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            rows: self.rows.len(),
            used_buckets: self.buckets.iter().filter(|b| !b.is_empty()).count(),
            longest_bucket: self.buckets.iter().map(|b| b.len()).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_find_hits_and_misses() {
        let vocab = Vocabulary::from_pairs([("dropbox", 3), ("www", 0), ("post", 1)]).unwrap();
        let table = HashTable::build(&vocab).unwrap();

        assert_eq!(table.find("dropbox"), Some(3));
        assert_eq!(table.find("www"), Some(0));
        assert_eq!(table.find("post"), Some(1));
        assert_eq!(table.find("get"), None);
        assert_eq!(table.find("Dropbox"), None);
        assert_eq!(table.buckets().len(), HASH_TABLE_SIZE);
    }

    #[test]
    fn test_rows_follow_feature_order() {
        let vocab = Vocabulary::from_pairs([("zz", 1), ("aa", 0)]).unwrap();
        let table = HashTable::build(&vocab).unwrap();
        assert_eq!(table.rows()[0].term, "aa");
        assert_eq!(table.rows()[1].term, "zz");

        let slot = bucket_of("zz");
        assert_eq!(table.buckets()[slot].as_slice(), &[1]);
    }

    #[test]
    fn test_stats() {
        let vocab = Vocabulary::from_feature_names(["upload", "precheck", "cmd"]).unwrap();
        let stats = HashTable::build(&vocab).unwrap().stats();
        assert_eq!(stats.rows, 3);
        assert!(stats.used_buckets >= 1 && stats.used_buckets <= 3);
        assert!(stats.longest_bucket >= 1);
    }
}
