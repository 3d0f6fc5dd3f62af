//! One function per §6 operation mode. Each takes already-parsed CLI args
//! and owns nothing beyond the borrowed catalog/items it's handed; `main`
//! owns file handles and the process exit code.

use crate::cli::{
    AmbiguousArgs, AssignArgs, CollectExpansionsArgs, CommonArgs, LinkArgs, UnexpectedArgs,
};
use crate::error::Result;
use crate::io;
use linkres_core::model::Block;
use linkres_core::{LoadedCatalog, acronym, normalize};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

fn build_loaded_catalog(
    common: &CommonArgs,
    config: &linkres_core::EngineConfig,
) -> Result<LoadedCatalog> {
    let mut catalog = io::load_catalog(&common.reference)?;
    if let Some(path) = &common.aliases {
        catalog.apply_aliases(io::load_alias_sidecar(path)?);
    }
    if let Some(path) = &common.translations {
        catalog.apply_translations(io::load_translation_sidecar(path)?);
    }
    if let Some(path) = &common.acronym_sidecar {
        catalog.apply_acronyms(io::load_alias_sidecar(path)?);
    }
    if let Some(path) = &common.links {
        catalog.apply_links(io::load_alias_sidecar(path)?);
    }
    if let Some(path) = &common.relationships {
        catalog.apply_relationships(io::load_relationship_sidecar(path)?);
    }
    Ok(LoadedCatalog::build(catalog, config.lookup_backend))
}

/// Partition source items into blocks by country, or a single global block
/// when blocking is disabled (§5).
fn block_by_country(items: &[linkres_core::SourceItem], enabled: bool) -> Vec<Block> {
    if !enabled {
        return vec![Block {
            key: String::new(),
            source_indices: (0..items.len()).collect(),
            canonical_ids: Vec::new(),
        }];
    }
    let mut by_key: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (i, item) in items.iter().enumerate() {
        let key = item.country.clone().unwrap_or_default();
        by_key.entry(key).or_default().push(i);
    }
    by_key
        .into_iter()
        .map(|(key, source_indices)| Block {
            key,
            source_indices,
            canonical_ids: Vec::new(),
        })
        .collect()
}

pub fn link(args: &LinkArgs) -> Result<()> {
    let config = args.engine_config();
    let loaded = build_loaded_catalog(&args.common, &config)?;
    let synonyms = args
        .common
        .synonyms
        .as_deref()
        .map(io::load_synonyms)
        .transpose()?;

    let mut items = io::load_source_items(&args.common.input)?;
    for item in items.iter_mut() {
        linkres_core::enrich_source_item(item, synonyms.as_ref(), config.keep_acronyms);
    }

    let mut n_matched = 0usize;
    let mut matches: Vec<Option<linkres_core::Match>> = Vec::with_capacity(items.len());
    for item in &items {
        let candidates = linkres_core::link_item(item, &loaded, &config, normalize::MAX_ACRO);
        matches.push(candidates.into_iter().next().map(|c| {
            linkres_core::Match {
                doc_id: item.doc_id.clone(),
                label: item.label.clone(),
                canonical_id: c.canonical_id,
                parent_canonical_id: None,
                canonical_label: loaded
                    .catalog
                    .get(c.canonical_id)
                    .map(|e| e.main_label.clone())
                    .unwrap_or_default(),
                score: c.score.score,
                reason: c.score.reason,
                city: item.city.clone(),
                country: item.country.clone(),
            }
        }));
        if matches.last().unwrap().is_some() {
            n_matched += 1;
        }
    }

    if args.common.stats {
        println!("{n_matched}/{} items produced a top candidate", items.len());
        return Ok(());
    }
    io::write_matches(args.common.output.as_deref(), &items, &matches)
}

pub fn assign(args: &AssignArgs) -> Result<()> {
    let config = args.engine_config();
    let loaded = build_loaded_catalog(&args.common, &config)?;
    let synonyms = args
        .common
        .synonyms
        .as_deref()
        .map(io::load_synonyms)
        .transpose()?;

    let mut items = io::load_source_items(&args.common.input)?;
    for item in items.iter_mut() {
        linkres_core::enrich_source_item(item, synonyms.as_ref(), config.keep_acronyms);
    }

    let blocks = block_by_country(&items, args.common.block_by_country());
    let mut matches: Vec<Option<linkres_core::Match>> = vec![None; items.len()];
    let mut n_matched = 0usize;
    for block in &blocks {
        let block_items: Vec<_> = block
            .source_indices
            .iter()
            .map(|&i| items[i].clone())
            .collect();
        if block_items.is_empty() {
            continue;
        }
        let block_matches =
            linkres_core::assign_block(&block_items, &loaded, &config, normalize::MAX_ACRO);
        for (&idx, m) in block.source_indices.iter().zip(block_matches) {
            if m.is_some() {
                n_matched += 1;
            }
            matches[idx] = m;
        }
    }

    if args.common.stats {
        println!("{n_matched}/{} items assigned", items.len());
        return Ok(());
    }
    io::write_matches(args.common.output.as_deref(), &items, &matches)
}

pub fn collect_expansions(args: &CollectExpansionsArgs) -> Result<()> {
    let items = io::load_source_items(&args.input)?;
    let corpus: Vec<String> = items.iter().map(|i| i.label.clone()).collect();

    // Two sources of acronym candidates, matching the original's
    // `acronymizeAll` flow: explicit colocated acronyms (`"... [ESPCI]"`),
    // plus every generated windowed acronym over each label's own tokens
    // (`acronymizePhrase`/`acronymizeTokens`).
    let mut candidates: FxHashMap<String, Vec<Vec<String>>> = FxHashMap::default();
    for label in &corpus {
        for (acro, stripped) in acronym::extract_by_colocation(label) {
            let tokens = normalize::normalize_and_tokens(&stripped, false);
            if !tokens.is_empty() {
                candidates.entry(acro).or_default().push(tokens);
            }
        }
        let tokens = normalize::normalize_and_tokens(label, true);
        for (acro, prefix) in acronym::acronymize(&tokens, acronym::AcroBounds::default_bounds()) {
            candidates.entry(acro).or_default().push(prefix.to_vec());
        }
    }

    let known = FxHashSet::default();
    let mut report: Vec<(String, Vec<String>, f64)> = candidates
        .into_iter()
        .map(|(acro, terms)| {
            let n_distinct: FxHashSet<&Vec<String>> = terms.iter().collect();
            let expansion = acronym::most_common_expansion(&terms);
            let score = acronym::score_acronym(&acro, n_distinct.len(), &corpus, &known, None);
            (acro, expansion, score)
        })
        .collect();
    report.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    for (acro, expansion, score) in &report {
        println!("{acro}\t{}\t{score:.4}", expansion.join(" "));
    }
    Ok(())
}

pub fn show_ambiguous(args: &AmbiguousArgs) -> Result<()> {
    let ambiguous = find_ambiguous_aliases(&args.reference)?;
    for (alias, owners) in &ambiguous {
        println!("{alias}\t{}", owners.join(" | "));
    }
    Ok(())
}

pub fn delete_ambiguous(args: &AmbiguousArgs) -> Result<()> {
    let ambiguous: FxHashSet<String> = find_ambiguous_aliases(&args.reference)?
        .into_iter()
        .map(|(alias, _)| alias)
        .collect();
    let rows = io::load_catalog_rows(&args.reference)?;
    let cleaned: Vec<Vec<String>> = rows
        .into_iter()
        .map(|mut row| {
            let main = row.remove(0);
            row.retain(|alias| !ambiguous.contains(alias));
            let mut out = vec![main];
            out.extend(row);
            out
        })
        .collect();
    io::write_catalog_rows(args.output.as_deref(), &cleaned)
}

/// `alias -> owning main labels` for aliases shared across more than one
/// canonical entry, per the catalog-integrity disposition of §7.
fn find_ambiguous_aliases(reference: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let rows = io::load_catalog_rows(reference)?;
    let mut owners: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for row in &rows {
        let Some((main, aliases)) = row.split_first() else {
            continue;
        };
        for alias in aliases {
            owners.entry(alias.clone()).or_default().push(main.clone());
        }
    }
    let mut out: Vec<(String, Vec<String>)> = owners
        .into_iter()
        .filter(|(_, mains)| {
            let distinct: FxHashSet<&String> = mains.iter().collect();
            distinct.len() > 1
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

pub fn show_unexpected(args: &UnexpectedArgs) -> Result<()> {
    for (doc_id, label) in find_unexpected(&args.input)? {
        println!("{doc_id}\t{label}");
    }
    Ok(())
}

pub fn delete_unexpected(args: &UnexpectedArgs) -> Result<()> {
    let unexpected: FxHashSet<String> = find_unexpected(&args.input)?
        .into_iter()
        .map(|(doc_id, _)| doc_id)
        .collect();
    let items = io::load_source_items(&args.input)?;
    let kept: Vec<_> = items
        .into_iter()
        .filter(|i| !unexpected.contains(&i.doc_id))
        .collect();
    let matches = vec![None; kept.len()];
    io::write_matches(args.output.as_deref(), &kept, &matches)
}

/// Source items whose label carries no token surviving normalization —
/// nothing in `ReferenceCatalog` could ever match them (§4.1, §7).
fn find_unexpected(input: &Path) -> Result<Vec<(String, String)>> {
    let items = io::load_source_items(input)?;
    Ok(items
        .into_iter()
        .filter(|item| normalize::normalize_and_tokens(&item.label, false).is_empty())
        .map(|item| (item.doc_id, item.label))
        .collect())
}
