//! Synonym / translation table (C8): an alt-form -> canonical-form reverse
//! map, used to rewrite surface forms before normalization.
//!
//! Grounded in `fileToVariantMap`'s `len(main) < 2` filter in the original
//! source.

use rustc_hash::FxHashMap;

/// Reverse index from an alternative string form to its single canonical
/// main form. Alternatives mapping to more than one canonical form are
/// dropped at load time (ties are ambiguous, not resolved).
#[derive(Debug, Clone, Default)]
pub struct VariantMap {
    alt_to_main: FxHashMap<String, String>,
}

impl VariantMap {
    /// Build from `(canonical, alternative)` rows. Rows sharing a canonical
    /// form may repeat; an alternative seen against more than one distinct
    /// canonical form is dropped entirely.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut candidates: FxHashMap<String, FxHashSet> = FxHashMap::default();
        for (main, alt) in rows {
            candidates.entry(alt).or_default().insert(main);
        }
        let alt_to_main = candidates
            .into_iter()
            .filter(|(_, mains)| mains.len() == 1)
            .map(|(alt, mains)| (alt, mains.into_iter().next().unwrap()))
            .collect();
        Self { alt_to_main }
    }

    pub fn len(&self) -> usize {
        self.alt_to_main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alt_to_main.is_empty()
    }

    /// Replace word-bounded occurrences of known alternative forms with
    /// their canonical form in a single left-to-right pass, longest match
    /// first. Idempotent per entry.
    pub fn translate(&self, phrase: &str) -> String {
        if self.alt_to_main.is_empty() {
            return phrase.to_string();
        }
        let mut alts: Vec<&String> = self.alt_to_main.keys().collect();
        alts.sort_by_key(|a| std::cmp::Reverse(a.len()));

        let mut out = String::with_capacity(phrase.len());
        let mut rest = phrase;
        'outer: while !rest.is_empty() {
            for alt in &alts {
                if rest.starts_with(alt.as_str()) {
                    let boundary_before = out
                        .chars()
                        .last()
                        .map(|c| !c.is_alphanumeric())
                        .unwrap_or(true);
                    let after = &rest[alt.len()..];
                    let boundary_after = after
                        .chars()
                        .next()
                        .map(|c| !c.is_alphanumeric())
                        .unwrap_or(true);
                    if boundary_before && boundary_after {
                        out.push_str(&self.alt_to_main[alt.as_str()]);
                        rest = after;
                        continue 'outer;
                    }
                }
            }
            let mut chars = rest.chars();
            let c = chars.next().unwrap();
            out.push(c);
            rest = chars.as_str();
        }
        out
    }
}

type FxHashSet = rustc_hash::FxHashSet<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unambiguous_alternative_kept() {
        let map = VariantMap::from_rows(vec![("University".to_string(), "Universite".to_string())]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.translate("Universite de Paris"), "University de Paris");
    }

    #[test]
    fn test_ambiguous_alternative_dropped() {
        let map = VariantMap::from_rows(vec![
            ("University".to_string(), "Uni".to_string()),
            ("Unicorn Corp".to_string(), "Uni".to_string()),
        ]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_translate_respects_word_boundary() {
        let map = VariantMap::from_rows(vec![("SARL".to_string(), "Societe".to_string())]);
        assert_eq!(map.translate("Societes"), "Societes");
        assert_eq!(map.translate("Societe Anonyme"), "SARL Anonyme");
    }
}
