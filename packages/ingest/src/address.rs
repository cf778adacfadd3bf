//! Address component cleaning for geocode-cache lookups.
//!
//! Provides a deterministic normalization pipeline applied symmetrically
//! when the cache was built and when it is queried, so that
//! "Av. Norte, 120" and "avenida norte 120" resolve to the same entry.

use std::sync::LazyLock;

use regex::Regex;

/// Regex to strip punctuation that does not contribute to address
/// matching.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;]+").expect("valid regex"));

/// Placeholder strings that mean "no value" in the raw export.
const MISSING_MARKERS: &[&str] = &["", "nan", "none", "unknown", "desconhecido"];

/// Expands a Portuguese road-type abbreviation to its full form.
///
/// Unknown tokens pass through unchanged.
fn expand_token(token: &str) -> &str {
    match token {
        "av" => "avenida",
        "r" => "rua",
        "estr" | "est" => "estrada",
        "rod" => "rodovia",
        "trav" => "travessa",
        "al" => "alameda",
        "pça" | "pca" => "praça",
        other => other,
    }
}

/// Cleans one address component (street, house number, or bairro).
///
/// The pipeline:
/// 1. Trim and lowercase
/// 2. Map missing-value markers to the empty string
/// 3. Strip punctuation
/// 4. Expand road-type abbreviations token by token
/// 5. Collapse whitespace
#[must_use]
pub fn clean_address_part(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    if MISSING_MARKERS.contains(&lower.as_str()) {
        return String::new();
    }

    let no_punct = PUNCTUATION_RE.replace_all(&lower, " ");
    let expanded: Vec<&str> = no_punct.split_whitespace().map(expand_token).collect();
    expanded.join(" ")
}

/// Builds the geocode-cache lookup key from cleaned address parts.
///
/// Empty parts are skipped; the city/state/country suffix is always
/// appended, matching the format the cache was built with.
#[must_use]
pub fn geocode_key(endereco: &str, numero: &str, bairro: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(6);
    for part in [endereco, numero, bairro] {
        if !part.is_empty() {
            parts.push(part);
        }
    }
    parts.extend(["Recife", "Pernambuco", "Brasil"]);
    parts.join(", ")
}
