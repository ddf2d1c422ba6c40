//! Impure construct classification
//!
//! Filters/tests/lookups known to be non-deterministic or
//! environment-dependent. An expression using any of these must produce a
//! fresh evaluation occurrence on every reference.

use crate::features::template::ports::parser::ParsedTemplate;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Non-deterministic or environment-dependent construct names.
///
/// All lookup-style calls are environment-dependent by nature (they read
/// files, pipes, or the controller environment), so `lookup`/`query`/`q`
/// are listed wholesale rather than per plugin.
static IMPURE_CONSTRUCTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "lookup",
        "query",
        "q",
        "now",
        "today",
        "random",
        "shuffle",
        "ansible_date_time",
        "password_hash",
        "to_uuid",
        "pipe",
        "env",
        "fileglob",
        "url",
    ]
    .into_iter()
    .collect()
});

pub fn is_impure_construct(name: &str) -> bool {
    IMPURE_CONSTRUCTS.contains(name)
}

/// Impure construct names used by `parsed`, first-use order, deduplicated
pub fn impure_components(parsed: &ParsedTemplate) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in parsed
        .lookups
        .iter()
        .chain(parsed.filters.iter())
        .chain(parsed.tests.iter())
    {
        if is_impure_construct(name) && !out.iter().any(|n| n == name) {
            out.push(name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_impure() {
        assert!(is_impure_construct("lookup"));
        assert!(is_impure_construct("now"));
        assert!(!is_impure_construct("default"));
        assert!(!is_impure_construct("upper"));
    }
}
