//! Direct reference vs. search term classification.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIRECT_REFERENCE: Regex =
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/")
            .expect("direct reference pattern is valid");
}

/// Result of classifying a raw input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The string handed to the fetch tool, before any search scoping.
    pub target: String,
    pub was_search: bool,
}

/// Whether `input` points at a single remote resource.
pub fn is_direct_reference(input: &str) -> bool {
    DIRECT_REFERENCE.is_match(input)
}

/// Classifies `input`. Forced searches are searches regardless of shape;
/// anything not recognized as a direct reference is a search term.
pub fn classify(input: &str, forced_search: bool) -> Classification {
    let was_search = forced_search || !is_direct_reference(input);
    Classification {
        target: input.to_string(),
        was_search,
    }
}
