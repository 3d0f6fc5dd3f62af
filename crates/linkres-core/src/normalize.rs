//! Case-folding, diacritic stripping, punctuation handling, stop-word filtering
//! and token validation. The single source of truth for comparability (C1).
//!
//! Grounded in `vocab_lookup.splitAndCase`/`validateTokens`/`toASCII` and
//! `gridder.splitAndCase`/`isValidToken` from the original Python source.

use rustc_hash::FxHashSet;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Lower bound on acronym length kept verbatim during case-folding.
pub const MIN_ACRO: usize = 3;
/// Upper bound on acronym length kept verbatim during case-folding.
pub const MAX_ACRO: usize = 6;

/// Characters replaced by a single space before tokenization, per §4.1 step 2.
/// The hyphen is handled separately so that digit-digit ranges survive.
const REPLACE_WITH_SPACE: &[char] = &[
    '{', '}', '[', ']', '(', ')', ',', '.', '"', '\'', ';', ':', '!', '?', '&', '^', '/', '*',
];

const STRIP_CHARS: &[char] = &[' ', '-', '_', '.', ',', '\'', '?', '!', '"'];

static STOP_WORDS: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    [
        // French prepositions (except "avec"/"sans", semantically meaningful)
        "a", "au", "aux", "de", "des", "du", "par", "pour", "sur", "chez", "dans", "sous", "vers",
        // French articles
        "le", "la", "les", "l", "c", "ce", "ca", // French coordinating conjunctions
        "mais", "et", "ou", "donc", "or", "ni", "car", // English stop words
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
        "does", "did", "will", "would", "could", "should", "may", "might", "can", "this", "that",
        "these", "those", "it", "its", "i", "you", "he", "she", "we", "they", "me", "him", "her",
        "us", "them", "my", "your", "his", "our", "their", "not", "no", "if", "then", "else", "so",
        "as", "up",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// ASCII-fold via canonical (NFKD) decomposition, dropping combining marks.
pub fn to_ascii(s: &str) -> String {
    s.nfkd().filter(|c| c.is_ascii()).collect()
}

fn preclean(token: &str) -> &str {
    token.trim_matches(STRIP_CHARS.as_ref()).trim()
}

fn is_acro_shaped(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let first_is_upper_letter = bytes[0].is_ascii_uppercase();
    let rest_digits = bytes[1..].iter().all(u8::is_ascii_digit);
    let all_upper_alnum = bytes
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    (first_is_upper_letter && rest_digits) || all_upper_alnum
}

/// Lower-case a token unless it should be preserved verbatim as an acronym.
pub fn case_token(token: &str, keep_acronyms: bool) -> String {
    let trimmed = token.trim();
    if keep_acronyms
        && (MIN_ACRO..=MAX_ACRO).contains(&trimmed.chars().count())
        && is_acro_shaped(trimmed)
    {
        to_ascii(trimmed)
    } else {
        to_ascii(&trimmed.to_lowercase())
    }
}

/// Default token validator: rejects empty/whitespace, pure digits, short
/// non-uppercase tokens, and stop words.
pub fn is_valid_token(token: &str) -> bool {
    let token = preclean(token);
    if token.is_empty() {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let is_all_upper_alpha = token.chars().all(|c| c.is_alphabetic())
        && token.chars().any(|c| c.is_alphabetic())
        && token == token.to_uppercase();
    if token.chars().count() <= 2 && !is_all_upper_alpha {
        return false;
    }
    !is_stop_word(&token.to_lowercase())
}

/// Default phrase validator: non-empty and not exclusively single-digit tokens.
pub fn is_valid_phrase(tokens: &[String]) -> bool {
    !tokens.is_empty()
        && !tokens
            .iter()
            .all(|t| t.len() == 1 && t.chars().all(|c| c.is_ascii_digit()))
}

/// Replace punctuation with spaces, preserving digit-digit hyphens (step 1-2).
fn pre_split(phrase: &str) -> String {
    let padded = format!(" {} ", phrase.trim());
    let mut out: Vec<char> = Vec::with_capacity(padded.len());
    let chars: Vec<char> = padded.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
            let next_digit = i + 1 < chars.len() && chars[i + 1].is_ascii_digit();
            if prev_digit && next_digit {
                out.push('-');
            } else {
                out.push(' ');
            }
        } else if REPLACE_WITH_SPACE.contains(&c) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.into_iter().collect()
}

/// Split and case-fold a phrase, without running it through validators.
pub fn split_and_case(phrase: &str, keep_acronyms: bool) -> Vec<String> {
    pre_split(phrase)
        .split_whitespace()
        .map(|t| case_token(preclean(t), keep_acronyms))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Full pipeline: split, case-fold, validate tokens, validate the phrase.
/// Returns an empty list if the phrase is rejected, matching the Python
/// contract of `validateTokens`/`normalizeAndValidateTokens`.
pub fn normalize_and_tokens_with(
    phrase: &str,
    keep_acronyms: bool,
    token_validator: impl Fn(&str) -> bool,
    phrase_validator: impl Fn(&[String]) -> bool,
) -> Vec<String> {
    if phrase.is_empty() {
        return Vec::new();
    }
    let tokens: Vec<String> = split_and_case(phrase, keep_acronyms)
        .into_iter()
        .filter(|t| token_validator(t))
        .collect();
    if phrase_validator(&tokens) {
        tokens
    } else {
        Vec::new()
    }
}

/// Convenience wrapper using the default validators.
pub fn normalize_and_tokens(phrase: &str, keep_acronyms: bool) -> Vec<String> {
    normalize_and_tokens_with(phrase, keep_acronyms, is_valid_token, is_valid_phrase)
}

/// Normalize to a joined string, or `None` if no valid tokens survive.
pub fn normalize_and_validate_phrase(phrase: &str, keep_acronyms: bool) -> Option<String> {
    let tokens = normalize_and_tokens(phrase, keep_acronyms);
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Cheap blocking key: pre-split, lower-cased, ASCII-folded, joined.
pub fn just_case(phrase: &str) -> String {
    split_and_case(phrase, false).join(" ")
}

/// Tokens that read as proper nouns in the original (pre-fold) phrase:
/// capitalized, longer than two characters, and not a stop word. A
/// dictionary-free stand-in for `filterProperNouns`'s English/French
/// dictionary exclusion (see DESIGN.md's documented simplification).
pub fn proper_noun_tokens(phrase: &str) -> Vec<String> {
    pre_split(phrase)
        .split_whitespace()
        .map(preclean)
        .filter(|t| {
            t.chars().count() > 2
                && t.chars().next().is_some_and(|c| c.is_uppercase())
                && !is_stop_word(&t.to_lowercase())
        })
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotence() {
        let p = "Université de Paris (UP)";
        let once = normalize_and_tokens(p, false).join(" ");
        let twice = normalize_and_tokens(&once, false).join(" ");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ascii_fold_no_nonascii_bytes() {
        let tokens = normalize_and_tokens("Métiers de la chimie", false);
        for t in &tokens {
            assert!(t.is_ascii(), "{t} contains non-ascii bytes");
        }
    }

    #[test]
    fn test_apostrophe_elided() {
        // just_case is the blocking-key path: no token validator runs, so
        // the short elided article survives.
        assert_eq!(just_case("PORT D'ENVAUX"), "port d envaux");
    }

    #[test]
    fn test_keep_acronym_case() {
        let tokens = normalize_and_tokens("ESPCI Paris", true);
        assert!(tokens.contains(&"ESPCI".to_string()));
    }

    #[test]
    fn test_drop_stop_words() {
        let tokens = normalize_and_tokens("Métiers de la chimie", false);
        assert!(!tokens.contains(&"de".to_string()));
        assert!(!tokens.contains(&"la".to_string()));
    }

    #[test]
    fn test_digit_hyphen_range_preserved() {
        let tokens = normalize_and_tokens("10-20 rue Vauquelin", false);
        assert!(tokens.iter().any(|t| t == "10-20"));
    }

    #[test]
    fn test_invalid_phrase_all_digits() {
        let tokens = normalize_and_tokens("1 2 3", false);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_just_case() {
        assert_eq!(just_case("Métiers de la Chimie"), "metiers de la chimie");
    }

    #[test]
    fn test_proper_noun_tokens_skips_lowercase_and_short() {
        let tokens = proper_noun_tokens("Ecole Superieure de Chimie Paris");
        assert_eq!(tokens, vec!["ecole", "superieure", "chimie", "paris"]);
    }
}
