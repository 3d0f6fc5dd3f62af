//! Candidate generation (C5): shortlist canonical entries for a source item
//! via token-frequency-ranked postings, then score each with C4.
//!
//! Grounded in `grid.py`'s candidate-shortlisting loop ahead of
//! `scoreItems`.

use crate::catalog::ReferenceCatalog;
use crate::config::EngineConfig;
use crate::model::{CanonicalId, SourceItem};
use crate::scorer::{self, StringScore};
use rustc_hash::{FxHashMap, FxHashSet};

/// Corpus-wide token counts, built once at load time and read-only during
/// matching (§5).
#[derive(Debug, Clone, Default)]
pub struct TokenFrequency {
    counts: FxHashMap<String, usize>,
}

impl TokenFrequency {
    pub fn observe(&mut self, tokens: &[String]) {
        for t in tokens {
            *self.counts.entry(t.clone()).or_insert(0) += 1;
        }
    }

    pub fn count_of(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }
}

const TOP_TOKENS: usize = 8;
const CANDIDATE_CAP: usize = 32;

/// A candidate canonical entry for a source item, with its computed score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub canonical_id: CanonicalId,
    pub score: StringScore,
}

/// Produce a ranked candidate list for `item` within `postings` (token ->
/// canonical ids sharing it), consulting `frequency` for token rarity and
/// `catalog` for full entries to score against.
pub fn generate_candidates(
    item: &SourceItem,
    tokens: &[String],
    postings: &FxHashMap<String, FxHashSet<CanonicalId>>,
    frequency: &TokenFrequency,
    catalog: &ReferenceCatalog,
    config: &EngineConfig,
) -> Vec<Candidate> {
    let mut ranked_tokens: Vec<&String> = tokens.iter().collect();
    ranked_tokens.sort_by_key(|t| frequency.count_of(t));
    ranked_tokens.truncate(TOP_TOKENS);

    let mut candidate_ids: FxHashSet<CanonicalId> = FxHashSet::default();
    for token in ranked_tokens {
        let Some(ids) = postings.get(token) else {
            continue;
        };
        if candidate_ids.len() + ids.len() > CANDIDATE_CAP {
            break;
        }
        candidate_ids.extend(ids.iter().copied());
    }

    if candidate_ids.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Candidate> = candidate_ids
        .into_iter()
        .filter_map(|id| {
            let entry = catalog.get(id)?;
            let score = scorer::score_item(item, entry, config)?;
            Some(Candidate {
                canonical_id: id,
                score,
            })
        })
        .collect();

    scored.sort_by_key(|c| std::cmp::Reverse(c.score.score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_postings_yields_no_candidates() {
        let item = SourceItem::new("d1", "nanovation sarl");
        let catalog = ReferenceCatalog::default();
        let frequency = TokenFrequency::default();
        let postings = FxHashMap::default();
        let config = EngineConfig::default();
        let out = generate_candidates(
            &item,
            &["nanovation".to_string()],
            &postings,
            &frequency,
            &catalog,
            &config,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_candidates_ranked_descending() {
        let rows = vec![
            vec!["nanovation societe a responsabilite limitee".to_string()],
            vec!["totally unrelated entry".to_string()],
        ];
        let catalog = ReferenceCatalog::from_rows(rows).unwrap();
        let item = SourceItem::new("d1", "nanovation societe a responsabilite limitee");
        let mut postings: FxHashMap<String, FxHashSet<CanonicalId>> = FxHashMap::default();
        postings
            .entry("nanovation".to_string())
            .or_default()
            .insert(CanonicalId(0));
        postings
            .entry("nanovation".to_string())
            .or_default()
            .insert(CanonicalId(1));
        let frequency = TokenFrequency::default();
        let config = EngineConfig::default();
        let out = generate_candidates(
            &item,
            &["nanovation".to_string()],
            &postings,
            &frequency,
            &catalog,
            &config,
        );
        assert_eq!(out[0].canonical_id, CanonicalId(0));
    }
}
