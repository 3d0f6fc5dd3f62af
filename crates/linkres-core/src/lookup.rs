//! Small-vocabulary approximate lookup (C3): index reference entries under
//! k-gram token windows, then shortlist candidate canonical terms for a
//! noisy query phrase using one of three backends.
//!
//! Grounded in `vocab_lookup.py`'s `FSSLookup`/`TokenRatioLookup`/
//! `SparseNgramLookup` and their shared `termsMatchingText` contract.

use crate::config::LookupBackend;
use crate::model::CanonicalId;
use crate::normalize;
use rustc_hash::{FxHashMap, FxHashSet};

/// Maximum k-gram width indexed and queried by default.
pub const MAX_INDEXED: usize = 4;
const PREFIX_NGRAM_WIDTH: usize = 4;
const RAREST_NGRAM_COUNT: usize = 5;

/// Edit-distance acceptance bound as a function of the shorter side's
/// length, shared by the FSS and sparse-n-gram backends.
fn distance_bound(shorter_len: usize) -> usize {
    if shorter_len >= 6 {
        2
    } else if shorter_len >= 4 {
        1
    } else {
        0
    }
}

/// Ratio acceptance threshold as a function of the shorter side's length,
/// shared by the token-ratio and sparse-n-gram backends.
fn ratio_threshold(shorter_len: usize) -> u32 {
    if shorter_len > 10 {
        60
    } else if shorter_len > 5 {
        50
    } else {
        40
    }
}

/// A posting: how many times a k-gram occurred, and which canonical ids
/// carry it.
#[derive(Debug, Clone, Default)]
pub struct Posting {
    pub count: usize,
    pub canonical_ids: FxHashSet<CanonicalId>,
}

/// Built once at catalog load, read-only during matching.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    backend: Option<LookupBackend>,
    /// normalized k-gram -> posting
    postings: FxHashMap<String, Posting>,
    /// every distinct normalized phrase ever indexed, for ratio-based backends
    phrases: Vec<String>,
    /// every phrase's full set of character n-grams, kept until `finalize`
    /// selects each phrase's globally rarest few
    phrase_ngrams: Vec<FxHashSet<String>>,
    /// broad n-gram -> phrase indices, every phrase carrying this n-gram
    /// anywhere in its normalized form; mirrors `NGLookup.idx0`
    prefix_postings: FxHashMap<String, FxHashSet<usize>>,
    /// narrow n-gram -> phrase indices, populated by `finalize` with only
    /// each phrase's `RAREST_NGRAM_COUNT` globally-rarest n-grams; mirrors
    /// `NGLookup.idx`'s `sorted(ngrams(term, n), key=lambda g: c[g])[:rarest]`
    /// selection
    rarest_postings: FxHashMap<String, FxHashSet<usize>>,
}

fn char_ngrams(s: &str, n: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < n {
        return vec![chars.iter().collect()];
    }
    (0..=chars.len() - n)
        .map(|i| chars[i..i + n].iter().collect())
        .collect()
}

impl LookupIndex {
    pub fn new(backend: LookupBackend) -> Self {
        Self {
            backend: Some(backend),
            ..Default::default()
        }
    }

    /// Index one canonical label under every k-gram window of size
    /// `1..=MAX_INDEXED`.
    pub fn index_label(&mut self, label: &str, id: CanonicalId) {
        let tokens = normalize::normalize_and_tokens(label, false);
        if tokens.is_empty() {
            return;
        }
        let normed = tokens.join(" ");
        let phrase_idx = self.phrases.len();
        self.phrases.push(normed.clone());

        for width in 1..=MAX_INDEXED.min(tokens.len()) {
            for window in tokens.windows(width) {
                let kgram = window.join(" ");
                let posting = self.postings.entry(kgram).or_default();
                posting.count += 1;
                posting.canonical_ids.insert(id);
            }
        }

        let ngrams: FxHashSet<String> = char_ngrams(&normed, PREFIX_NGRAM_WIDTH).into_iter().collect();
        for ng in &ngrams {
            self.prefix_postings
                .entry(ng.clone())
                .or_default()
                .insert(phrase_idx);
        }
        self.phrase_ngrams.push(ngrams);
    }

    /// Select each indexed phrase's globally rarest n-grams into the narrow
    /// postings index, mirroring `NGLookup.idx`'s rarity-sorted selection.
    /// Must be called once after the last `index_label` and before any
    /// sparse-n-gram query; a no-op if called more than once.
    pub fn finalize(&mut self) {
        if !self.rarest_postings.is_empty() || self.phrase_ngrams.is_empty() {
            return;
        }
        let mut global_freq: FxHashMap<&str, usize> = FxHashMap::default();
        for ngrams in &self.phrase_ngrams {
            for ng in ngrams {
                *global_freq.entry(ng.as_str()).or_insert(0) += 1;
            }
        }
        for (idx, ngrams) in self.phrase_ngrams.iter().enumerate() {
            let mut rarity_ranked: Vec<&String> = ngrams.iter().collect();
            rarity_ranked.sort_by_key(|ng| global_freq.get(ng.as_str()).copied().unwrap_or(0));
            for ng in rarity_ranked.into_iter().take(RAREST_NGRAM_COUNT) {
                self.rarest_postings.entry(ng.clone()).or_default().insert(idx);
            }
        }
    }

    /// For each k-gram of sizes `1..=max_window` sliding over `text`, find
    /// approximate matches via the configured backend; fold duplicate
    /// canonical ids by summing counts.
    pub fn terms_matching_text(
        &self,
        text: &str,
        max_window: usize,
        min_count: usize,
    ) -> FxHashMap<String, (usize, FxHashSet<CanonicalId>)> {
        let tokens = normalize::normalize_and_tokens(text, false);
        if tokens.is_empty() {
            return FxHashMap::default();
        }
        let mut out: FxHashMap<String, (usize, FxHashSet<CanonicalId>)> = FxHashMap::default();
        for width in 1..=max_window.min(tokens.len()) {
            for window in tokens.windows(width) {
                let kgram = window.join(" ");
                let matched = match self.backend.unwrap_or(LookupBackend::Fss) {
                    LookupBackend::Fss => self.fss_matches(&kgram),
                    LookupBackend::TokenRatio => self.token_ratio_matches(&kgram),
                    LookupBackend::SparseNgram => self.sparse_ngram_matches(&kgram),
                };
                for (term, ids) in matched {
                    let entry = out.entry(term).or_insert((0, FxHashSet::default()));
                    entry.0 += 1;
                    entry.1.extend(ids);
                }
            }
        }
        out.retain(|_, (count, _)| *count >= min_count);
        out
    }

    fn fss_matches(&self, kgram: &str) -> Vec<(String, FxHashSet<CanonicalId>)> {
        let bound = distance_bound(kgram.chars().count());
        let mut hits: Vec<(usize, String, FxHashSet<CanonicalId>)> = Vec::new();
        for (term, posting) in &self.postings {
            let dist = strsim::generic_levenshtein(
                &term.chars().collect::<Vec<_>>(),
                &kgram.chars().collect::<Vec<_>>(),
            );
            if dist <= bound {
                hits.push((dist, term.clone(), posting.canonical_ids.clone()));
            }
        }
        hits.sort_by_key(|(d, _, _)| *d);
        hits.into_iter().map(|(_, t, ids)| (t, ids)).collect()
    }

    fn token_ratio_matches(&self, kgram: &str) -> Vec<(String, FxHashSet<CanonicalId>)> {
        let threshold = ratio_threshold(kgram.chars().count());
        let mut scored: Vec<(u32, String)> = self
            .phrases
            .iter()
            .map(|p| (crate::fuzzy::ratio(kgram, p), p.clone()))
            .filter(|(r, _)| *r >= threshold)
            .collect();
        scored.sort_by_key(|(r, _)| std::cmp::Reverse(*r));
        scored.truncate(2);
        scored
            .into_iter()
            .filter_map(|(_, term)| {
                self.postings
                    .get(&term)
                    .map(|p| (term, p.canonical_ids.clone()))
            })
            .collect()
    }

    fn sparse_ngram_matches(&self, kgram: &str) -> Vec<(String, FxHashSet<CanonicalId>)> {
        let threshold = ratio_threshold(kgram.chars().count());
        let query_ngrams: FxHashSet<String> =
            char_ngrams(kgram, PREFIX_NGRAM_WIDTH).into_iter().collect();

        // Narrow tier first: each phrase's globally rarest n-grams are the
        // most selective signal. Broaden to the prefix tier only if the
        // rarest-n-gram index misses entirely.
        let mut phrase_hits: FxHashMap<usize, usize> = FxHashMap::default();
        for ng in &query_ngrams {
            if let Some(idxs) = self.rarest_postings.get(ng) {
                for &idx in idxs {
                    *phrase_hits.entry(idx).or_insert(0) += 1;
                }
            }
        }
        if phrase_hits.is_empty() {
            for ng in &query_ngrams {
                if let Some(idxs) = self.prefix_postings.get(ng) {
                    for &idx in idxs.iter().take(RAREST_NGRAM_COUNT) {
                        *phrase_hits.entry(idx).or_insert(0) += 1;
                    }
                }
            }
        }
        let mut scored: Vec<(usize, usize)> = phrase_hits.into_iter().collect();
        scored.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        scored
            .into_iter()
            .filter_map(|(idx, _)| {
                let term = self.phrases.get(idx)?;
                let r = crate::fuzzy::ratio(kgram, term);
                if r < threshold {
                    return None;
                }
                self.postings
                    .get(term)
                    .map(|p| (term.clone(), p.canonical_ids.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_label_roundtrip_fss() {
        let mut idx = LookupIndex::new(LookupBackend::Fss);
        idx.index_label("Ecole Superieure de Physique et Chimie", CanonicalId(1));
        let hits = idx.terms_matching_text("Ecole Superieure de Physique et Chimie", 4, 1);
        assert!(hits.values().any(|(_, ids)| ids.contains(&CanonicalId(1))));
    }

    #[test]
    fn test_token_ratio_backend_finds_near_match() {
        let mut idx = LookupIndex::new(LookupBackend::TokenRatio);
        idx.index_label(
            "Nanovation Societe a responsabilite limitee",
            CanonicalId(2),
        );
        let hits = idx.terms_matching_text("Nanovation Societe a responsabilite limite", 5, 1);
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_distance_bound_thresholds() {
        assert_eq!(distance_bound(2), 0);
        assert_eq!(distance_bound(5), 1);
        assert_eq!(distance_bound(8), 2);
    }

    #[test]
    fn test_sparse_ngram_backend_finds_exact_label_after_finalize() {
        let mut idx = LookupIndex::new(LookupBackend::SparseNgram);
        idx.index_label("Ecole Superieure de Physique et Chimie", CanonicalId(1));
        idx.index_label("Nanovation Societe a responsabilite limitee", CanonicalId(2));
        idx.finalize();
        let hits = idx.terms_matching_text("Ecole Superieure de Physique et Chimie", 6, 1);
        assert!(hits.values().any(|(_, ids)| ids.contains(&CanonicalId(1))));
    }

    #[test]
    fn test_sparse_ngram_rarest_tier_is_narrower_than_prefix_tier() {
        let mut idx = LookupIndex::new(LookupBackend::SparseNgram);
        idx.index_label("Ecole Superieure de Physique et Chimie", CanonicalId(1));
        idx.index_label("Nanovation Societe a responsabilite limitee", CanonicalId(2));
        idx.finalize();
        let rarest_entries: usize = idx.rarest_postings.values().map(|s| s.len()).sum();
        let prefix_entries: usize = idx.prefix_postings.values().map(|s| s.len()).sum();
        assert!(rarest_entries <= prefix_entries);
    }
}
