//! Host-side twin of the generated tokenizer
//!
//! Tokens are maximal runs of ASCII alphanumeric bytes, lowercased, at least
//! two bytes long. Runs longer than [`MAX_TOKEN_LEN`] are cut into
//! consecutive chunks exactly as the fixed 1024-byte buffer in generated code
//! cuts them. Everything else is a separator, including non-ASCII bytes.

use crate::hash_table::HashTable;
use crate::request::FIELD_COUNT;

/// Longest token the generated buffer holds (1024 bytes minus terminator)
pub const MAX_TOKEN_LEN: usize = 1023;

/// Shorter tokens are discarded
pub const MIN_TOKEN_LEN: usize = 2;

/// Iterator over the lowercase tokens of one input string
pub struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_alphanumeric() {
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                return None;
            }

            let start = self.pos;
            while self.pos < self.bytes.len()
                && self.bytes[self.pos].is_ascii_alphanumeric()
                && self.pos - start < MAX_TOKEN_LEN
            {
                self.pos += 1;
            }

            if self.pos - start >= MIN_TOKEN_LEN {
                let token = self.bytes[start..self.pos].to_ascii_lowercase();
                // ASCII alphanumerics only, so always valid UTF-8
                return Some(token.into_iter().map(char::from).collect());
            }
        }
    }
}

/// Tokenize one input string.
pub fn tokenize(input: &str) -> Tokens<'_> {
    Tokens::new(input)
}

/// Whether the tokenizer can ever emit `term`.
pub fn is_reachable_term(term: &str) -> bool {
    (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&term.len())
        && term
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Binary bag-of-words presence vector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices of the features that are set, ascending.
    pub fn active(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Extract the presence vector for the eight positional inputs.
///
/// Absent inputs read as empty strings.
pub fn extract_features(
    inputs: &[Option<&str>; FIELD_COUNT],
    table: &HashTable,
    max_features: usize,
) -> FeatureVector {
    let mut features = FeatureVector::zeros(max_features);
    for input in inputs {
        for token in tokenize(input.unwrap_or("")) {
            if let Some(idx) = table.find(&token) {
                if idx < max_features {
                    features.0[idx] = 1;
                }
            }
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocabulary;

    fn tokens(input: &str) -> Vec<String> {
        tokenize(input).collect()
    }

    #[test]
    fn test_splits_on_non_alphanumerics() {
        assert_eq!(
            tokens("https://www.Dropbox.com/cmd/upload_precheck"),
            vec!["https", "www", "dropbox", "com", "cmd", "upload", "precheck"]
        );
        assert_eq!(
            tokens("text/plain; charset=utf-8"),
            vec!["text", "plain", "charset", "utf"]
        );
    }

    #[test]
    fn test_short_and_empty_inputs() {
        assert!(tokens("").is_empty());
        assert!(tokens("-").is_empty());
        assert!(tokens("a b c 1").is_empty());
        assert_eq!(tokens("a bc"), vec!["bc"]);
    }

    #[test]
    fn test_non_ascii_is_a_separator() {
        assert_eq!(tokens("café-au"), vec!["caf", "au"]);
        assert_eq!(tokens("über"), vec!["ber"]);
    }

    #[test]
    fn test_long_runs_are_chunked() {
        let long = "a".repeat(MAX_TOKEN_LEN + 5);
        let out = tokens(&long);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), MAX_TOKEN_LEN);
        assert_eq!(out[1], "aaaaa");

        // A trailing single byte after a full chunk is dropped
        let out = tokens(&"b".repeat(MAX_TOKEN_LEN + 1));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_reachable_terms() {
        assert!(is_reachable_term("utf8"));
        assert!(!is_reachable_term("x"));
        assert!(!is_reachable_term("Upper"));
        assert!(!is_reachable_term("snake_case"));
        assert!(!is_reachable_term(""));
    }

    #[test]
    fn test_extract_binary_presence() {
        let vocab = Vocabulary::from_pairs([("post", 0), ("dropbox", 1), ("json", 2)]).unwrap();
        let table = HashTable::build(&vocab).unwrap();

        let inputs = [
            Some("www.dropbox.com"),
            Some("/dropbox/dropbox"),
            Some("POST"),
            None,
            Some(""),
            None,
            None,
            Some("-"),
        ];
        let features = extract_features(&inputs, &table, 3);
        assert_eq!(features.as_slice(), &[1, 1, 0]);
        assert_eq!(features.active(), vec![0, 1]);
    }

    #[test]
    fn test_indices_past_max_features_ignored() {
        let vocab = Vocabulary::from_pairs([("post", 0), ("json", 5)]).unwrap();
        let table = HashTable::build(&vocab).unwrap();
        let mut inputs = [None; FIELD_COUNT];
        inputs[0] = Some("post json");
        let features = extract_features(&inputs, &table, 3);
        assert_eq!(features.as_slice(), &[1, 0, 0]);
    }
}
