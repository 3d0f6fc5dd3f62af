//! linkres-core: entity resolution engine
//!
//! Links noisy free-text mentions to canonical entries in curated reference
//! catalogs and assigns each match a numeric confidence. Single-threaded,
//! deterministic, and free of I/O — callers hand in already-parsed rows and
//! get back `Match`es.

pub mod acronym;
pub mod assignment;
pub mod candidates;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod lookup;
pub mod model;
pub mod normalize;
pub mod scorer;
pub mod synonyms;

pub use catalog::ReferenceCatalog;
pub use config::{AssignmentMode, EngineConfig, LookupBackend};
pub use error::{LinkError, Result};
pub use model::{CanonicalEntry, CanonicalId, Match, RelationshipKind, SourceItem};
pub use synonyms::VariantMap;

use candidates::TokenFrequency;
use lookup::LookupIndex;
use rustc_hash::FxHashSet;

/// Everything built once at load time and held read-only during matching
/// (§5): the catalog, its lookup index, the corpus-wide token frequency
/// table, and the acronym → expansion map harvested from the catalog's own
/// declared acronyms.
pub struct LoadedCatalog {
    pub catalog: ReferenceCatalog,
    pub index: LookupIndex,
    pub frequency: TokenFrequency,
    pub acronyms: acronym::AcronymMap,
}

impl LoadedCatalog {
    /// Build the lookup index, token-frequency table, and acronym map for
    /// an already constructed `ReferenceCatalog`.
    pub fn build(catalog: ReferenceCatalog, backend: LookupBackend) -> Self {
        let mut index = LookupIndex::new(backend);
        let mut frequency = TokenFrequency::default();
        let mut acronyms = acronym::AcronymMap::default();
        for entry in catalog.entries() {
            for label in entry.variant_strings() {
                index.index_label(label, entry.id);
                let tokens = normalize::normalize_and_tokens(label, false);
                frequency.observe(&tokens);
            }
            if let Some(acro) = &entry.acronym {
                let tokens = normalize::normalize_and_tokens(&entry.main_label, false);
                if !tokens.is_empty() {
                    acronyms.entry(acro.to_lowercase()).or_insert((tokens, 1.0));
                }
            }
        }
        index.finalize();
        Self {
            catalog,
            index,
            frequency,
            acronyms,
        }
    }
}

/// Enrich a source item in place: normalize tokens, extract acronyms by
/// colocation, and apply synonym translation — the one-time pre-processing
/// pass described in §3's lifecycle note.
pub fn enrich_source_item(
    item: &mut SourceItem,
    synonyms: Option<&VariantMap>,
    keep_acronyms: bool,
) {
    let translated = synonyms
        .map(|m| m.translate(&item.label))
        .unwrap_or_else(|| item.label.clone());
    if translated != item.label {
        item.variants.push(translated);
    }
    // Org/address labels commonly lead with the organization's own name or
    // acronym before a comma-separated postal address; keep that lead
    // segment as a variant in its own right.
    if let Some(lead) = item.label.split(',').next() {
        let lead = lead.trim();
        if !lead.is_empty() && lead != item.label {
            item.is_address_label = true;
            item.variants.push(lead.to_string());
        }
    }
    for (acro, _stripped) in acronym::extract_by_colocation(&item.label) {
        item.acros.push(acro);
    }
    let whole_acro = acronym::acronymize_whole(&item.label);
    if !whole_acro.is_empty() && !item.acros.contains(&whole_acro) {
        item.acros.push(whole_acro);
    }
    let _ = normalize::normalize_and_tokens(&item.label, keep_acronyms);
}

/// Candidate emission for a single source item against a loaded catalog
/// (the `link` operation mode of §6): enrich, shortlist, score, rank.
pub fn link_item(
    item: &SourceItem,
    loaded: &LoadedCatalog,
    config: &EngineConfig,
    max_window: usize,
) -> Vec<candidates::Candidate> {
    let tokens = normalize::normalize_and_tokens(&item.label, config.keep_acronyms);
    if tokens.is_empty() {
        tracing::info!(doc_id = %item.doc_id, "empty candidate set: no valid tokens");
        return Vec::new();
    }

    let matches = loaded.index.terms_matching_text(&item.label, max_window, 1);
    let mut postings: rustc_hash::FxHashMap<String, FxHashSet<CanonicalId>> =
        rustc_hash::FxHashMap::default();
    for (term, (_, ids)) in matches {
        postings.entry(term).or_default().extend(ids);
    }

    let mut candidates = candidates::generate_candidates(
        item,
        &tokens,
        &postings,
        &loaded.frequency,
        &loaded.catalog,
        config,
    );

    // Direct lookup found nothing: broaden by trying each acronym-expanded
    // variant of the label in turn, widening the window to match the
    // expansion's extra length (§4.2's `expansions`, `link_field.py:137-143`).
    if candidates.is_empty() && !loaded.acronyms.is_empty() {
        let base_tokens = normalize::normalize_and_tokens(&item.label, false);
        let bounds = acronym::AcroBounds::for_catalog_size(loaded.catalog.len());
        for expanded in acronym::expansions(&base_tokens, &loaded.acronyms, bounds) {
            if expanded == base_tokens {
                continue;
            }
            let phrase = expanded.join(" ");
            let widened_window = max_window + expanded.len().saturating_sub(base_tokens.len());
            let expanded_matches = loaded.index.terms_matching_text(&phrase, widened_window, 1);
            let mut expanded_postings: rustc_hash::FxHashMap<String, FxHashSet<CanonicalId>> =
                rustc_hash::FxHashMap::default();
            for (term, (_, ids)) in expanded_matches {
                expanded_postings.entry(term).or_default().extend(ids);
            }
            let expanded_candidates = candidates::generate_candidates(
                item,
                &expanded,
                &expanded_postings,
                &loaded.frequency,
                &loaded.catalog,
                config,
            );
            if !expanded_candidates.is_empty() {
                candidates = expanded_candidates;
                break;
            }
        }
    }

    if candidates.is_empty() {
        tracing::info!(doc_id = %item.doc_id, "empty candidate set: no shared token with any reference entry");
    }
    candidates
}

/// One-to-one assignment across an entire block of source items (the
/// `assign` operation mode of §6): per-item candidate generation followed
/// by greedy or min-cost assignment, then the three rescue passes.
pub fn assign_block(
    items: &[SourceItem],
    loaded: &LoadedCatalog,
    config: &EngineConfig,
    max_window: usize,
) -> Vec<Option<Match>> {
    let candidates_by_item: Vec<Vec<candidates::Candidate>> = items
        .iter()
        .map(|item| link_item(item, loaded, config, max_window))
        .collect();

    let mut matches = match config.assignment_mode {
        AssignmentMode::Greedy => assignment::assign_greedy(items, &candidates_by_item),
        AssignmentMode::MinCost => assignment::assign_min_cost(items, &candidates_by_item),
    };

    for m in matches.iter_mut().flatten() {
        if let Some(entry) = loaded.catalog.get(m.canonical_id) {
            m.canonical_label = entry.main_label.clone();
        }
    }

    assignment::propagate_parent_grid(items, &mut matches);
    assignment::infer_reference_parent(&mut matches, |id| {
        loaded
            .catalog
            .get(id)
            .and_then(|e| e.parents.first().copied())
    });
    assignment::prefix_match(items, &mut matches);

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> LoadedCatalog {
        let rows = vec![
            vec![
                "Ecole Superieure de Physique et Chimie Industrielles".to_string(),
                "ESPCI".to_string(),
            ],
            vec!["Chimie".to_string()],
        ];
        let catalog = ReferenceCatalog::from_rows(rows).unwrap();
        LoadedCatalog::build(catalog, LookupBackend::Fss)
    }

    #[test]
    fn test_link_item_finds_abbreviation_alias() {
        let loaded = sample_catalog();
        let mut item = SourceItem::new("d1", "ESPCI, 10 rue Vauquelin, 75231 Paris cedex 05");
        enrich_source_item(&mut item, None, false);
        let config = EngineConfig::default();
        let candidates = link_item(&item, &loaded, &config, 4);
        assert!(!candidates.is_empty());
    }

    #[test]
    fn test_link_item_falls_back_to_acronym_expansion() {
        let rows = vec![vec!["Langues etrangeres appliquees".to_string()]];

        let without_acronym =
            LoadedCatalog::build(ReferenceCatalog::from_rows(rows.clone()).unwrap(), LookupBackend::Fss);
        let mut item = SourceItem::new("d1", "LEA Anglais, Chinois");
        enrich_source_item(&mut item, None, false);
        let config = EngineConfig::default();
        assert!(
            link_item(&item, &without_acronym, &config, normalize::MAX_ACRO).is_empty(),
            "none of LEA/Anglais/Chinois appears verbatim in the catalog's postings"
        );

        let mut catalog = ReferenceCatalog::from_rows(rows).unwrap();
        catalog.apply_acronyms(vec![(
            "Langues etrangeres appliquees".to_string(),
            "LEA".to_string(),
        )]);
        let with_acronym = LoadedCatalog::build(catalog, LookupBackend::Fss);
        assert!(!with_acronym.acronyms.is_empty());

        let expanded = link_item(&item, &with_acronym, &config, normalize::MAX_ACRO);
        assert!(!expanded.is_empty());
        assert_eq!(
            with_acronym
                .catalog
                .get(expanded[0].canonical_id)
                .unwrap()
                .main_label,
            "Langues etrangeres appliquees"
        );
    }

    #[test]
    fn test_assign_block_one_to_one() {
        let loaded = sample_catalog();
        let items = vec![
            SourceItem::new("d1", "Chimie"),
            SourceItem::new("d2", "Metiers de la chimie"),
        ];
        let config = EngineConfig {
            assignment_mode: AssignmentMode::MinCost,
            ..Default::default()
        };
        let matches = assign_block(&items, &loaded, &config, 4);
        let ids: FxHashSet<CanonicalId> =
            matches.iter().flatten().map(|m| m.canonical_id).collect();
        assert_eq!(ids.len(), matches.iter().filter(|m| m.is_some()).count());
    }
}
