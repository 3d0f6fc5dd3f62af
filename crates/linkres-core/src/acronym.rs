//! Generate, detect, score, and expand acronyms of token sequences (C2).
//!
//! Grounded in `acronyms.py`'s `Referential.acronymizeTokens`/`scoreAcronyms`/
//! `acronymExpansions` and `gridder.py`'s `extractAcronymsByColocation`.

use crate::normalize;
use rustc_hash::{FxHashMap, FxHashSet};

/// Default ambiguity penalty exponent base.
pub const AMBIGUITY_FACTOR: f64 = 4.0;
/// Default penalty for acronyms that also occur uncapitalized in running text.
pub const CAP_FACTOR: f64 = 8.0;
/// Default penalty divisor for acronyms common in a general-language frequency table.
pub const COMMON_FACTOR: f64 = 32.0;
/// Default boost for acronyms present in a curated known-acronym list.
pub const KNOWN_FACTOR: f64 = 16.0;

/// Acronym length bounds, adapted downward for large catalogs per §4.2.
#[derive(Debug, Clone, Copy)]
pub struct AcroBounds {
    pub min: usize,
    pub max: usize,
}

impl AcroBounds {
    pub fn default_bounds() -> Self {
        Self {
            min: normalize::MIN_ACRO,
            max: normalize::MAX_ACRO,
        }
    }

    /// Shrink both bounds by `floor(ln(max(1, catalog_size / 100)))`, pinning
    /// the natural-log reading of the Open Question in §9.
    pub fn for_catalog_size(catalog_size: usize) -> Self {
        let base = Self::default_bounds();
        let ratio = (catalog_size as f64 / 100.0).max(1.0);
        let discount = ratio.ln().floor() as i64;
        let min = (base.min as i64 - discount).max(1) as usize;
        let max = (base.max as i64 - discount).max(min as i64) as usize;
        Self { min, max }
    }
}

/// Lazily yield `(acronym, prefix_tokens)` pairs for `s` in `[max(min, len), min(max, len)]`.
/// Finite and not restartable: consume once per query (§9).
pub fn acronymize<'a>(
    tokens: &'a [String],
    bounds: AcroBounds,
) -> impl Iterator<Item = (String, &'a [String])> + 'a {
    let len = tokens.len();
    let lo = bounds.min.max(len);
    let hi = bounds.max.min(len);
    (lo..=hi).filter(move |&s| s > 0).map(move |s| {
        let prefix = &tokens[..s];
        let acro: String = prefix
            .iter()
            .filter_map(|t| t.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        (acro, prefix)
    })
}

/// Build the upper-case acronym for the first `s` tokens, matching what
/// `acronymize` would yield for `s = tokens.len()` exactly. Used by the
/// scorer's acronym shortcut.
pub fn acronymize_whole(phrase: &str) -> String {
    let tokens = normalize::normalize_and_tokens(phrase, true);
    tokens
        .iter()
        .filter_map(|t| t.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Yield `(acronym, stripped_phrase)` for every bracketed/parenthesized
/// upper-case token, e.g. `"... [ESPCI]"` → `("ESPCI", "...")`.
pub fn extract_by_colocation(phrase: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (open, close) in [('[', ']'), ('(', ')')] {
        let mut search_from = 0;
        while let Some(rel_start) = phrase[search_from..].find(open) {
            let start = search_from + rel_start;
            if let Some(rel_end) = phrase[start..].find(close) {
                let end = start + rel_end;
                let inner = &phrase[start + 1..end];
                if !inner.is_empty()
                    && inner.chars().all(|c| {
                        c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ' || c == '/'
                    })
                {
                    let mut stripped = String::with_capacity(phrase.len());
                    stripped.push_str(&phrase[..start]);
                    stripped.push_str(&phrase[end + 1..]);
                    out.push((inner.to_string(), stripped.trim().to_string()));
                }
                search_from = end + 1;
            } else {
                break;
            }
        }
    }
    out
}

/// The winning expansion among candidate token-tuples for an acronym: the
/// most frequent tuple, matching `mostCommonInList`.
pub fn most_common_expansion(terms: &[Vec<String>]) -> Vec<String> {
    let mut counts: FxHashMap<&Vec<String>, usize> = FxHashMap::default();
    for t in terms {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, c)| *c)
        .map(|(t, _)| t.clone())
        .unwrap_or_default()
}

/// Score a candidate acronym `A` against a text corpus, per the §4.2 formula.
/// `known_acronyms` is a curated list; `general_freq` a general-language
/// frequency table with its precomputed mean.
pub fn score_acronym(
    acronym: &str,
    n_distinct_terms: usize,
    corpus: &[String],
    known_acronyms: &FxHashSet<String>,
    general_freq: Option<(&FxHashMap<String, f64>, f64)>,
) -> f64 {
    let f_cap = corpus.iter().filter(|p| p.contains(acronym)).count() as f64;
    let f_total = corpus
        .iter()
        .filter(|p| p.to_uppercase().contains(&acronym.to_uppercase()))
        .count() as f64;
    let f_nocap = (f_total - f_cap).max(0.0);
    if f_cap < 1.0 {
        return 0.0;
    }
    let mut s =
        f_cap / (AMBIGUITY_FACTOR.powi(n_distinct_terms as i32) * (f_cap + CAP_FACTOR * f_nocap));
    if let Some((table, mean)) = general_freq
        && let Some(&freq) = table.get(acronym)
        && freq > 0.0
    {
        s *= mean / (freq * COMMON_FACTOR);
    }
    if known_acronyms.contains(acronym) {
        s *= KNOWN_FACTOR;
    }
    s
}

/// A learned acronym → (best expansion tokens, score) map.
pub type AcronymMap = FxHashMap<String, (Vec<String>, f64)>;

/// Yield the tokens themselves, then, for each token that is itself a known
/// in-range acronym, a variant with that token replaced by its best
/// expansion. Broadens lookup when direct matching produced no hit.
pub fn expansions(
    tokens: &[String],
    acronyms: &AcronymMap,
    bounds: AcroBounds,
) -> Vec<Vec<String>> {
    let mut out = vec![tokens.to_vec()];
    for (i, t) in tokens.iter().enumerate() {
        let len = t.chars().count();
        if len < bounds.min || len > bounds.max {
            continue;
        }
        if let Some((expansion, _)) = acronyms.get(t) {
            let mut variant = tokens[..i].to_vec();
            variant.extend(expansion.iter().cloned());
            variant.extend(tokens[i + 1..].iter().cloned());
            out.push(variant);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acronymize_bounds() {
        let tokens: Vec<String> = ["ecole", "superieure", "physique", "chimie"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let bounds = AcroBounds { min: 3, max: 4 };
        for (acro, prefix) in acronymize(&tokens, bounds) {
            assert!(acro.len() >= bounds.min && acro.len() <= bounds.max);
            for (i, t) in prefix.iter().enumerate() {
                assert_eq!(
                    acro.chars().nth(i),
                    t.chars().next().map(|c| c.to_ascii_uppercase())
                );
            }
        }
    }

    #[test]
    fn test_extract_by_colocation() {
        let phrase = "Ecole Superieure de Physique et Chimie Industrielles [ESPCI]";
        let found = extract_by_colocation(phrase);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "ESPCI");
        assert!(!found[0].1.contains('['));
    }

    #[test]
    fn test_catalog_size_discount() {
        let small = AcroBounds::for_catalog_size(50);
        let large = AcroBounds::for_catalog_size(100_000);
        assert!(large.max <= small.max);
    }

    #[test]
    fn test_expansions_includes_original() {
        let tokens = vec!["lea".to_string(), "anglais".to_string()];
        let acronyms = AcronymMap::default();
        let bounds = AcroBounds::default_bounds();
        let exp = expansions(&tokens, &acronyms, bounds);
        assert_eq!(exp[0], tokens);
    }
}
