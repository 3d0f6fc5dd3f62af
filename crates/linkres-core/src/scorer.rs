//! Multi-signal similarity scoring (C4): a string-pair layer and an
//! item-level layer that folds in structured fields.
//!
//! Grounded in `gridder.py`'s `scoreStrings`/`checkCandidate` and
//! `grid.py`'s `scoreItems`.

use crate::acronym::acronymize_whole;
use crate::config::EngineConfig;
use crate::model::CanonicalEntry;
use crate::normalize;
use crate::{fuzzy, model::SourceItem};

/// Floor under which the string layer discards a pair outright.
pub const MIN_STRING_SCORE: u32 = 20;

/// A string-pair score plus the sub-evidence that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StringScore {
    pub score: u32,
    pub reason: String,
}

/// Reject the pair when both sides carry enough proper-noun material but it
/// doesn't overlap, mirroring `REQUIRES_SHARED_PROPER_NOUN`'s
/// `filterProperNouns`/`token_sort_ratio`/`token_set_ratio` gate. Sides with
/// too little proper-noun material to judge (`<= 3` chars, matching the
/// original's guard) pass through ungated.
fn shared_proper_noun_gate(a: &str, b: &str) -> bool {
    let a_proper = normalize::proper_noun_tokens(a);
    let b_proper = normalize::proper_noun_tokens(b);
    if a_proper.join(" ").chars().count() <= 3 || b_proper.join(" ").chars().count() <= 3 {
        return true;
    }
    if fuzzy::token_sort_ratio(&a_proper, &b_proper) < 10 {
        return false;
    }
    fuzzy::token_set_ratio(&a_proper, &b_proper) >= 20
}

/// Score two already ASCII-folded, case-normalized strings in [0, 100].
/// Implements the acronym shortcut, character layer, and token layer of
/// §4.4, aggregating via `S = (abs*part*sort^2*set^3) / 100^6`.
pub fn score_strings(a: &str, b: &str, config: &EngineConfig) -> StringScore {
    let acro_a = acronymize_whole(a);
    let acro_b = acronymize_whole(b);
    if !acro_a.is_empty() && acro_a == b.to_uppercase() {
        return StringScore {
            score: 100,
            reason: format!("acronym match: {a} = {acro_a}"),
        };
    }
    if !acro_b.is_empty() && acro_b == a.to_uppercase() {
        return StringScore {
            score: 100,
            reason: format!("acronym match: {b} = {acro_b}"),
        };
    }

    let a_tokens = normalize::normalize_and_tokens(a, false);
    let b_tokens = normalize::normalize_and_tokens(b, false);
    let a_norm = a_tokens.join(" ");
    let b_norm = b_tokens.join(" ");

    let abs = fuzzy::ratio(&a_norm, &b_norm);
    let part = fuzzy::partial_ratio(&a_norm, &b_norm);
    if abs < 20 || part < 30 {
        return StringScore {
            score: 0,
            reason: String::new(),
        };
    }

    let sort = fuzzy::token_sort_ratio(&a_tokens, &b_tokens);
    let set = fuzzy::token_set_ratio(&a_tokens, &b_tokens);
    if sort < 40 || set < 50 {
        return StringScore {
            score: 0,
            reason: String::new(),
        };
    }

    if config.require_shared_proper_noun && !shared_proper_noun_gate(a, b) {
        return StringScore {
            score: 0,
            reason: String::new(),
        };
    }

    let s = (abs as f64) * (part as f64) * (sort as f64).powi(2) * (set as f64).powi(3)
        / 100f64.powi(6);
    if s <= 60.0 {
        StringScore {
            score: 0,
            reason: String::new(),
        }
    } else {
        StringScore {
            score: s.round() as u32,
            reason: format!(
                "variant pair ({a:?}, {b:?}) abs={abs} part={part} sort={sort} set={set}"
            ),
        }
    }
}

/// 100 on exact equality, 0 otherwise; used for the city/country/research
/// unit-id components.
fn field_ratio(a: Option<&str>, b: Option<&str>) -> u32 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let r = fuzzy::ratio(&a.to_lowercase(), &b.to_lowercase());
            if r >= 80 { 100 } else { 0 }
        }
        _ => 50,
    }
}

/// Extract a coarse second-level-domain label from a URL for comparison
/// against source variants (e.g. `https://www.espci.fr/` -> `espci`).
fn second_level_domain(url: &str) -> Option<String> {
    let without_scheme = url.split("://").last().unwrap_or(url);
    let host = without_scheme.split('/').next()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let mut parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    parts.pop();
    parts.pop().map(|s| s.to_lowercase())
}

/// Best string score across the cross product of source and reference
/// variant strings, remembering the winning pair as the reason.
fn best_variant_score(variants: &[String], entry: &CanonicalEntry, config: &EngineConfig) -> StringScore {
    let mut best = StringScore {
        score: 0,
        reason: String::new(),
    };
    for v in variants {
        for candidate in entry.variant_strings() {
            let s = score_strings(v, candidate, config);
            if s.score > best.score {
                best = s;
            }
        }
    }
    best
}

/// Best acronym-equality ratio between the item's extracted acronyms and
/// the entry's declared one, mirroring `score_items`'s `score_acro`.
fn acronym_component(item: &SourceItem, entry: &CanonicalEntry) -> (u32, Option<String>) {
    let Some(entry_acro) = entry.acronym.as_deref() else {
        return (0, None);
    };
    item.acros
        .iter()
        .map(|a| (fuzzy::ratio(a, entry_acro), a))
        .max_by_key(|(r, _)| *r)
        .filter(|(r, _)| *r > 0)
        .map(|(r, a)| {
            (
                r,
                Some(format!("acronym ratio ({a:?}, {entry_acro:?})={r}")),
            )
        })
        .unwrap_or((0, None))
}

/// URL second-level-domain match, contributing 100 on a hit, 0 otherwise.
fn url_component(variants: &[String], entry: &CanonicalEntry) -> (u32, Option<String>) {
    let Some(url) = entry.url.as_deref() else {
        return (0, None);
    };
    let Some(domain) = second_level_domain(url) else {
        return (0, None);
    };
    if variants.iter().any(|v| v.to_lowercase().contains(&domain)) {
        (100, Some(format!("url domain match: {domain}")))
    } else {
        (0, None)
    }
}

/// Research-unit-id exact equality, contributing 100 on a hit, 0 otherwise.
fn research_unit_component(item: &SourceItem, entry: &CanonicalEntry) -> (u32, Option<String>) {
    match (
        item.research_unit_id.as_deref(),
        entry.research_unit_id.as_deref(),
    ) {
        (Some(a), Some(b)) if a == b => (100, Some("research unit id match".to_string())),
        _ => (0, None),
    }
}

/// Full item-level score (§4.4, item extension): the string component is
/// the best of the string-pair score, the acronym-equality score, the URL
/// score, and the research-unit-id score — alternative routes to the same
/// conclusion, matching `score_items`'s `max(score_str, score_acro)`
/// generalized to the item extension's added signals. The result is
/// multiplied by the city/country ratios and gated on the configured floor.
/// Returns `None` if the pair falls below it.
pub fn score_item(
    item: &SourceItem,
    entry: &CanonicalEntry,
    config: &EngineConfig,
) -> Option<StringScore> {
    let mut variants = vec![item.label.clone()];
    variants.extend(item.variants.iter().cloned());

    let string_score = best_variant_score(&variants, entry, config);
    let (acro_score, acro_reason) = acronym_component(item, entry);
    let (url_score, url_reason) = url_component(&variants, entry);
    let (unit_score, unit_reason) = research_unit_component(item, entry);

    let string_component = string_score
        .score
        .max(acro_score)
        .max(url_score)
        .max(unit_score);
    if string_component < config.min_string_score {
        return None;
    }

    let reasons: Vec<String> = [
        (string_score.score, Some(string_score.reason)),
        (acro_score, acro_reason),
        (url_score, url_reason),
        (unit_score, unit_reason),
    ]
    .into_iter()
    .filter(|(score, reason)| *score > 0 && reason.is_some())
    .filter_map(|(_, reason)| reason)
    .collect();

    let country_component = field_ratio(item.country.as_deref(), entry.country.as_deref());
    let city_component = field_ratio(item.city.as_deref(), entry.city.as_deref());

    let product = (string_component as u64 * country_component as u64 * city_component as u64)
        as f64
        / 100f64.powi(2);

    if product <= 0.0 {
        return None;
    }

    Some(StringScore {
        score: product.round() as u32,
        reason: reasons.join("; "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalId;

    #[test]
    fn test_identical_strings_score_high() {
        let config = EngineConfig::default();
        let s = score_strings(
            "ecole superieure de chimie",
            "ecole superieure de chimie",
            &config,
        );
        assert_eq!(s.score, 100);
    }

    #[test]
    fn test_unrelated_strings_score_zero() {
        let config = EngineConfig::default();
        let s = score_strings("paris university", "quantum mechanics textbook", &config);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_acronym_shortcut() {
        let config = EngineConfig::default();
        let s = score_strings(
            "ESPCI",
            "Ecole Superieure de Physique et Chimie Industrielles",
            &config,
        );
        assert_eq!(s.score, 100);
    }

    #[test]
    fn test_shared_proper_noun_gate_rejects_unrelated_names() {
        let config = EngineConfig {
            require_shared_proper_noun: true,
            ..Default::default()
        };
        let s = score_strings(
            "Ecole Superieure de Chimie Paris",
            "Ecole Superieure de Chimie Marseille",
            &config,
        );
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_shared_proper_noun_gate_allows_shared_name() {
        let config = EngineConfig {
            require_shared_proper_noun: true,
            ..Default::default()
        };
        let s = score_strings(
            "Ecole Superieure de Chimie Paris",
            "Ecole Superieure de Chimie de Paris",
            &config,
        );
        assert!(s.score > 0);
    }

    #[test]
    fn test_score_item_self_match_floor() {
        let entry = CanonicalEntry {
            id: CanonicalId(1),
            main_label: "nanovation sarl".into(),
            ..Default::default()
        };
        let item = SourceItem::new("d1", "nanovation sarl");
        let config = EngineConfig::default();
        let score = score_item(&item, &entry, &config).expect("self match must score");
        assert!(score.score >= MIN_STRING_SCORE);
    }

    #[test]
    fn test_second_level_domain() {
        assert_eq!(
            second_level_domain("https://www.espci.fr/about"),
            Some("espci".to_string())
        );
    }
}
