//! Levenshtein-based string ratios in the spirit of `fuzzywuzzy`'s
//! `ratio` / `partial_ratio` / `token_sort_ratio` / `token_set_ratio`,
//! rebuilt on top of `strsim::levenshtein` since no Python `fuzzywuzzy`
//! equivalent exists in the Rust ecosystem.
//!
//! Grounded in every call site in `gridder.py`/`grid.py`'s `scoreStrings`/
//! `checkCandidate` (`fuzz.ratio`, `fuzz.partial_ratio`, `fuzz.token_sort_ratio`,
//! `fuzz.token_set_ratio`).

use rustc_hash::FxHashSet;

/// Levenshtein-ratio percentage in [0, 100]: `(len_a + len_b - dist) / (len_a + len_b) * 100`.
pub fn ratio(a: &str, b: &str) -> u32 {
    let (a, b) = (a.chars().collect::<Vec<_>>(), b.chars().collect::<Vec<_>>());
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let dist = char_levenshtein(&a, &b);
    (100 * (total - dist.min(total)) / total) as u32
}

/// Best-window ratio: slide the shorter string across the longer one and
/// keep the best-scoring alignment, matching `fuzzywuzzy.partial_ratio`.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() {
        (&a, &b)
    } else {
        (&b, &a)
    };
    if shorter.is_empty() {
        return if longer.is_empty() { 100 } else { 0 };
    }
    if longer.len() <= shorter.len() {
        return ratio(
            &shorter.iter().collect::<String>(),
            &longer.iter().collect::<String>(),
        );
    }
    let window = shorter.len();
    let mut best = 0u32;
    for start in 0..=(longer.len() - window) {
        let slice: String = longer[start..start + window].iter().collect();
        let r = ratio(&shorter.iter().collect::<String>(), &slice);
        best = best.max(r);
    }
    best
}

fn char_levenshtein(a: &[char], b: &[char]) -> usize {
    strsim::generic_levenshtein(&a.to_vec(), &b.to_vec())
}

fn sorted_tokens(tokens: &[String]) -> String {
    let mut v = tokens.to_vec();
    v.sort();
    v.join(" ")
}

/// Ratio computed on alphabetically-sorted tokens of each side.
pub fn token_sort_ratio(a_tokens: &[String], b_tokens: &[String]) -> u32 {
    ratio(&sorted_tokens(a_tokens), &sorted_tokens(b_tokens))
}

/// The best of: intersection-only, intersection+A-only, intersection+B-only,
/// matching `fuzzywuzzy.token_set_ratio`.
pub fn token_set_ratio(a_tokens: &[String], b_tokens: &[String]) -> u32 {
    let a_set: FxHashSet<&String> = a_tokens.iter().collect();
    let b_set: FxHashSet<&String> = b_tokens.iter().collect();

    let mut intersection: Vec<String> = a_set.intersection(&b_set).map(|s| s.to_string()).collect();
    intersection.sort();
    let mut only_a: Vec<String> = a_set.difference(&b_set).map(|s| s.to_string()).collect();
    only_a.sort();
    let mut only_b: Vec<String> = b_set.difference(&a_set).map(|s| s.to_string()).collect();
    only_b.sort();

    let t0 = intersection.join(" ");
    let t1 = if only_a.is_empty() {
        t0.clone()
    } else {
        format!("{t0} {}", only_a.join(" ")).trim().to_string()
    };
    let t2 = if only_b.is_empty() {
        t0.clone()
    } else {
        format!("{t0} {}", only_b.join(" ")).trim().to_string()
    };

    ratio(&t0, &t1).max(ratio(&t0, &t2)).max(ratio(&t1, &t2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical() {
        assert_eq!(ratio("paris", "paris"), 100);
    }

    #[test]
    fn test_ratio_symmetry() {
        assert_eq!(ratio("chimie", "chimique"), ratio("chimique", "chimie"));
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_eq!(partial_ratio("espci", "the espci school"), 100);
    }

    #[test]
    fn test_token_sort_ratio_order_insensitive() {
        let a = vec!["paris".to_string(), "university".to_string()];
        let b = vec!["university".to_string(), "paris".to_string()];
        assert_eq!(token_sort_ratio(&a, &b), 100);
    }

    #[test]
    fn test_token_set_ratio_subset() {
        let a = vec!["paris".to_string(), "university".to_string()];
        let b = vec![
            "paris".to_string(),
            "university".to_string(),
            "france".to_string(),
        ];
        assert_eq!(token_set_ratio(&a, &b), 100);
    }
}
