//! Command-line argument contract of the compiled predictor
//!
//! Every request becomes exactly [`ARG_COUNT`] arguments in field order.
//! Missing values become `-`, and the rest are escaped so that the argument
//! survives shell-style handling on every platform.

use apiclass_rfc_compiler::request::{Request, FIELD_COUNT};

/// Arguments passed after the program name
pub const ARG_COUNT: usize = FIELD_COUNT;

/// Placeholder for a missing value
pub const MISSING: &str = "-";

/// Sanitize one field for the command line.
///
/// Absent, empty and NaN values (`nan` in any case, as exported by
/// dataframes) become `-`. Otherwise `\` → `\\`, `"` → `\"` and each space
/// becomes `%20`, in a single pass.
pub fn sanitize(value: Option<&str>) -> String {
    let s = match value {
        None => return MISSING.to_string(),
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("nan") => {
            return MISSING.to_string()
        }
        Some(s) => s,
    };

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            ' ' => out.push_str("%20"),
            c => out.push(c),
        }
    }
    out
}

/// Build the positional arguments for `request`.
pub fn build_args(request: &Request) -> Vec<String> {
    request.fields().iter().map(|f| sanitize(*f)).collect()
}
