use apiclass_rfc_compiler::synth::synthetic_vocabulary;
use apiclass_rfc_compiler::tokenizer::{is_reachable_term, tokenize, MAX_TOKEN_LEN};
use apiclass_rfc_compiler::{extract_features, HashTable, FIELD_COUNT};
use proptest::prelude::*;

// Property-based tests for the host-side tokenizer
// Any input, including non-ASCII and control bytes, must tokenize the same
// way every time and only ever produce terms the hash table can hold.

fn arbitrary_fields() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(prop::option::of(".{0,64}"), FIELD_COUNT)
}

fn as_inputs(fields: &[Option<String>]) -> [Option<&str>; FIELD_COUNT] {
    let mut inputs = [None; FIELD_COUNT];
    for (slot, field) in inputs.iter_mut().zip(fields) {
        *slot = field.as_deref();
    }
    inputs
}

proptest! {
    #[test]
    fn tokens_are_always_reachable_terms(input in ".{0,256}") {
        for token in tokenize(&input) {
            prop_assert!(is_reachable_term(&token), "{:?}", token);
            prop_assert!(token.len() <= MAX_TOKEN_LEN);
        }
    }

    #[test]
    fn tokenization_is_deterministic(input in "[ -~]{0,128}") {
        let first: Vec<String> = tokenize(&input).collect();
        let second: Vec<String> = tokenize(&input).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ascii_case_does_not_matter(input in "[ -~]{0,128}") {
        let lower: Vec<String> = tokenize(&input.to_ascii_lowercase()).collect();
        let upper: Vec<String> = tokenize(&input.to_ascii_uppercase()).collect();
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn feature_vectors_are_binary_and_stable(fields in arbitrary_fields()) {
        let vocab = synthetic_vocabulary(200).unwrap();
        let table = HashTable::build(&vocab).unwrap();
        let inputs = as_inputs(&fields);

        let first = extract_features(&inputs, &table, 256);
        let second = extract_features(&inputs, &table, 256);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), 256);
        prop_assert!(first.as_slice().iter().all(|&v| v <= 1));
    }

    #[test]
    fn known_terms_are_detected(idx in 0usize..200, noise in "[^a-zA-Z0-9]{1,8}") {
        let vocab = synthetic_vocabulary(200).unwrap();
        let table = HashTable::build(&vocab).unwrap();
        let term = vocab.entries()[idx].term.to_ascii_uppercase();
        let text = format!("{noise}{term}{noise}");

        let mut inputs = [None; FIELD_COUNT];
        inputs[idx % FIELD_COUNT] = Some(text.as_str());
        let features = extract_features(&inputs, &table, vocab.len());
        prop_assert_eq!(features.active(), vec![vocab.entries()[idx].index]);
    }
}
