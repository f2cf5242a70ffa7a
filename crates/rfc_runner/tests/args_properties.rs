//! Property tests for the command-line argument encoding.

use apiclass_rfc_compiler::Request;
use apiclass_rfc_runner::{build_args, sanitize, ARG_COUNT, MISSING};
use proptest::prelude::*;

/// Undo [`sanitize`] for a present, non-NaN value.
fn unescape(arg: &str) -> String {
    let mut out = String::new();
    let mut rest = arg;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("%20") {
            out.push(' ');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\\"") {
            out.push('"');
            rest = tail;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

proptest! {
    #[test]
    fn prop_sanitized_args_have_no_spaces(value in "[ a-zA-Z0-9\\\\\"/;=.-]{0,40}") {
        let arg = sanitize(Some(&value));
        prop_assert!(!arg.is_empty());
        prop_assert!(!arg.contains(' '));
    }

    #[test]
    fn prop_sanitize_is_reversible(value in "[ a-zA-Z0-9\\\\\"/;=.]{1,40}") {
        prop_assume!(!value.eq_ignore_ascii_case("nan"));
        // "%20" in the input is ambiguous, so the alphabet leaves out '%'
        prop_assert_eq!(unescape(&sanitize(Some(&value))), value);
    }

    #[test]
    fn prop_always_eight_args(fields in proptest::array::uniform8(proptest::option::of("[ -~]{0,12}"))) {
        let request = Request::from_fields(fields.clone());
        let args = build_args(&request);
        prop_assert_eq!(args.len(), ARG_COUNT);
        for (field, arg) in fields.iter().zip(&args) {
            let missing = field
                .as_deref()
                .map_or(true, |f| f.is_empty() || f.eq_ignore_ascii_case("nan"));
            if missing {
                prop_assert_eq!(arg.as_str(), MISSING);
            }
        }
    }
}
