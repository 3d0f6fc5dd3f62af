//! One-to-one assignment across a block (C6): greedy claiming or a min-cost
//! bipartite solve, plus the three fallback rescue passes.
//!
//! Grounded in `grid.py`'s greedy matcher and `gridder.py`'s assignment-mode
//! branch; the min-cost solver is re-expressed here as the equivalent
//! maximum-weight matching per the design note in §9.

use crate::candidates::Candidate;
use crate::model::{CanonicalId, Match, SourceItem};
use pathfinding::kuhn_munkres::kuhn_munkres;
use pathfinding::matrix::Matrix;
use rustc_hash::{FxHashMap, FxHashSet};

/// Walk source items in input order; claim the best still-unclaimed
/// candidate. A canonical id already claimed by a distinct source item is
/// skipped for everyone after it.
pub fn assign_greedy(
    items: &[SourceItem],
    candidates_by_item: &[Vec<Candidate>],
) -> Vec<Option<Match>> {
    let mut claimed: FxHashSet<CanonicalId> = FxHashSet::default();
    let mut out = Vec::with_capacity(items.len());
    for (item, candidates) in items.iter().zip(candidates_by_item) {
        let chosen = candidates
            .iter()
            .find(|c| !claimed.contains(&c.canonical_id));
        match chosen {
            Some(c) => {
                claimed.insert(c.canonical_id);
                out.push(Some(Match {
                    doc_id: item.doc_id.clone(),
                    label: item.label.clone(),
                    canonical_id: c.canonical_id,
                    parent_canonical_id: None,
                    canonical_label: String::new(),
                    score: c.score.score,
                    reason: c.score.reason.clone(),
                    city: item.city.clone(),
                    country: item.country.clone(),
                }));
            }
            None => out.push(None),
        }
    }
    out
}

/// Solve a min-cost bipartite assignment over the whole block: build an
/// m x n matrix (m source items, n distinct candidate ids), padded to a
/// square with zero-weight dummy rows/columns, and maximize total weight
/// where weight = candidate score (the 100 - cost reading of §4.6, since
/// maximizing weight is equivalent to minimizing cost on a fixed-size
/// matrix). Padded cells never win because every real emitted score exceeds
/// zero (§9).
pub fn assign_min_cost(
    items: &[SourceItem],
    candidates_by_item: &[Vec<Candidate>],
) -> Vec<Option<Match>> {
    let mut column_ids: Vec<CanonicalId> = Vec::new();
    let mut column_index: FxHashMap<CanonicalId, usize> = FxHashMap::default();
    for candidates in candidates_by_item {
        for c in candidates {
            column_index.entry(c.canonical_id).or_insert_with(|| {
                column_ids.push(c.canonical_id);
                column_ids.len() - 1
            });
        }
    }

    let rows = items.len();
    let cols = column_ids.len();
    if rows == 0 || cols == 0 {
        return vec![None; rows];
    }

    let size = rows.max(cols);
    let mut weights = Matrix::new(size, size, 0i64);
    let mut reason_at: FxHashMap<(usize, usize), String> = FxHashMap::default();
    for (i, candidates) in candidates_by_item.iter().enumerate() {
        for c in candidates {
            let j = column_index[&c.canonical_id];
            weights[(i, j)] = c.score.score as i64;
            reason_at.insert((i, j), c.score.reason.clone());
        }
    }

    let (_total, assignment) = kuhn_munkres(&weights);

    let mut out = vec![None; rows];
    for (i, item) in items.iter().enumerate() {
        let j = assignment[i];
        if j >= cols {
            continue;
        }
        let score = weights[(i, j)];
        if score <= 0 {
            continue;
        }
        out[i] = Some(Match {
            doc_id: item.doc_id.clone(),
            label: item.label.clone(),
            canonical_id: column_ids[j],
            parent_canonical_id: None,
            canonical_label: String::new(),
            score: score as u32,
            reason: reason_at.get(&(i, j)).cloned().unwrap_or_default(),
            city: item.city.clone(),
            country: item.country.clone(),
        });
    }
    out
}

/// Fallback 1: if an unmatched item has a parent label that is itself
/// matched (by exact label), attach the parent's canonical id to the child.
pub fn propagate_parent_grid(items: &[SourceItem], matches: &mut [Option<Match>]) {
    let label_to_canonical: FxHashMap<&str, CanonicalId> = items
        .iter()
        .zip(matches.iter())
        .filter_map(|(item, m)| m.as_ref().map(|m| (item.label.as_str(), m.canonical_id)))
        .collect();

    for (item, m) in items.iter().zip(matches.iter_mut()) {
        if m.is_some() {
            continue;
        }
        let Some(parent_label) = item.parent_label.as_deref() else {
            continue;
        };
        if let Some(&parent_id) = label_to_canonical.get(parent_label) {
            *m = Some(Match {
                doc_id: item.doc_id.clone(),
                label: item.label.clone(),
                canonical_id: parent_id,
                parent_canonical_id: Some(parent_id),
                canonical_label: String::new(),
                score: 0,
                reason: "parent grid propagation".to_string(),
                city: item.city.clone(),
                country: item.country.clone(),
            });
        }
    }
}

/// Fallback 2: for a matched item whose canonical entry has a parent,
/// expose that parent canonical id on the match.
pub fn infer_reference_parent(
    matches: &mut [Option<Match>],
    parent_of: impl Fn(CanonicalId) -> Option<CanonicalId>,
) {
    for m in matches.iter_mut().flatten() {
        if m.parent_canonical_id.is_none() {
            m.parent_canonical_id = parent_of(m.canonical_id);
        }
    }
}

/// Fallback 3: for each unmatched item, iteratively trim the last
/// whitespace-delimited suffix of its label; if the truncated label matches
/// a previously matched source item's label, adopt that item's canonical id
/// as the parent canonical id. Iterates source items sorted by label for a
/// deterministic result (§9).
pub fn prefix_match(items: &[SourceItem], matches: &mut [Option<Match>]) {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[a].label.cmp(&items[b].label));

    let label_to_canonical: FxHashMap<&str, CanonicalId> = items
        .iter()
        .zip(matches.iter())
        .filter_map(|(item, m)| m.as_ref().map(|m| (item.label.as_str(), m.canonical_id)))
        .collect();

    for &i in &order {
        if matches[i].is_some() {
            continue;
        }
        let mut label = items[i].label.as_str();
        while let Some(pos) = label.rfind(char::is_whitespace) {
            label = label[..pos].trim_end();
            if label.is_empty() {
                break;
            }
            if let Some(&parent_id) = label_to_canonical.get(label) {
                matches[i] = Some(Match {
                    doc_id: items[i].doc_id.clone(),
                    label: items[i].label.clone(),
                    canonical_id: parent_id,
                    parent_canonical_id: Some(parent_id),
                    canonical_label: String::new(),
                    score: 0,
                    reason: "prefix match".to_string(),
                    city: items[i].city.clone(),
                    country: items[i].country.clone(),
                });
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::StringScore;

    fn candidate(id: u32, score: u32) -> Candidate {
        Candidate {
            canonical_id: CanonicalId(id),
            score: StringScore {
                score,
                reason: "test".to_string(),
            },
        }
    }

    #[test]
    fn test_greedy_skips_claimed_id() {
        let items = vec![SourceItem::new("d1", "a"), SourceItem::new("d2", "b")];
        let candidates = vec![
            vec![candidate(1, 90)],
            vec![candidate(1, 80), candidate(2, 70)],
        ];
        let matches = assign_greedy(&items, &candidates);
        assert_eq!(matches[0].as_ref().unwrap().canonical_id, CanonicalId(1));
        assert_eq!(matches[1].as_ref().unwrap().canonical_id, CanonicalId(2));
    }

    #[test]
    fn test_min_cost_one_to_one() {
        let items = vec![SourceItem::new("d1", "a"), SourceItem::new("d2", "b")];
        let candidates = vec![
            vec![candidate(1, 90), candidate(2, 10)],
            vec![candidate(1, 85), candidate(2, 60)],
        ];
        let matches = assign_min_cost(&items, &candidates);
        let ids: FxHashSet<CanonicalId> =
            matches.iter().flatten().map(|m| m.canonical_id).collect();
        assert_eq!(ids.len(), matches.iter().filter(|m| m.is_some()).count());
    }

    #[test]
    fn test_prefix_match_trims_suffix() {
        let items = vec![
            SourceItem::new("d1", "10 rue Vauquelin"),
            SourceItem::new("d2", "10 rue Vauquelin 75005"),
        ];
        let mut matches = vec![
            Some(Match {
                doc_id: "d1".into(),
                label: "10 rue Vauquelin".into(),
                canonical_id: CanonicalId(5),
                parent_canonical_id: None,
                canonical_label: String::new(),
                score: 80,
                reason: String::new(),
                city: None,
                country: None,
            }),
            None,
        ];
        prefix_match(&items, &mut matches);
        assert_eq!(
            matches[1].as_ref().unwrap().parent_canonical_id,
            Some(CanonicalId(5))
        );
    }
}
