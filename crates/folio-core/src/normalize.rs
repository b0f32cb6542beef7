//! Query folding for the name searches.

use unicode_normalization::UnicodeNormalization;

/// Trim, apply NFKC (fullwidth → ASCII, compose diacritics) and lowercase.
pub fn fold(s: &str) -> String {
    s.trim().nfkc().collect::<String>().to_lowercase()
}

/// Whether `name` contains an already-folded `query`. An empty query matches everything.
pub fn matches(name: &str, folded_query: &str) -> bool {
    folded_query.is_empty() || fold(name).contains(folded_query)
}
