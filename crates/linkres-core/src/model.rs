//! Shared data model (§3): tokens, canonical entries, source items, matches,
//! and blocks. Canonical entries are addressed by an integer handle rather
//! than a shared reference so that parent/child edges can't form a reference
//! cycle (§9).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A single comparable token: ASCII-folded, case-folded unless preserved as
/// an acronym. See `normalize` for the rules that produce these.
pub type Token = String;

/// An ordered token sequence.
pub type Phrase = Vec<Token>;

/// Integer handle into a `ReferenceCatalog`'s entry table. Parent/child
/// edges are stored as these, never as shared references, so traversal can
/// defend against cycles with a visited-set guard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CanonicalId(pub u32);

/// The kind of edge a related canonical entry plays, per the relationship
/// sidecar file (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RelationshipKind {
    Parent,
    Child,
}

/// The unit of a reference catalog (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalEntry {
    pub id: CanonicalId,
    pub main_label: String,
    pub aliases: Vec<String>,
    /// Translated labels keyed by ISO 639 language code.
    pub translations: FxHashMap<String, String>,
    pub acronym: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub url: Option<String>,
    pub research_unit_id: Option<String>,
    pub links: Vec<String>,
    pub parents: Vec<CanonicalId>,
    pub children: Vec<CanonicalId>,
}

impl CanonicalEntry {
    /// Every surface form worth comparing against: main label, aliases, and
    /// translations, in that order.
    pub fn variant_strings(&self) -> Vec<&str> {
        let mut out = vec![self.main_label.as_str()];
        out.extend(self.aliases.iter().map(String::as_str));
        out.extend(self.translations.values().map(String::as_str));
        out
    }
}

/// The unit of input (§3). Derived fields are populated once during
/// enrichment and are read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceItem {
    pub doc_id: String,
    pub label: String,
    pub parent_label: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub acronym: Option<String>,

    /// Derived: textual variants generated during enrichment (e.g. synonym
    /// expansion, acronym expansion).
    pub variants: Vec<String>,
    /// Derived: acronyms extracted from the label by colocation or
    /// generation.
    pub acros: Vec<String>,
    pub is_address_label: bool,
    pub research_unit_id: Option<String>,
}

impl SourceItem {
    pub fn new(doc_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            label: label.into(),
            ..Default::default()
        }
    }
}

/// A decided link from a source item to a canonical entry (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub doc_id: String,
    pub label: String,
    pub canonical_id: CanonicalId,
    pub parent_canonical_id: Option<CanonicalId>,
    pub canonical_label: String,
    pub score: u32,
    pub reason: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A partition of source items and canonical entries sharing a blocking key
/// (§3). Matching is performed block-by-block.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub key: String,
    pub source_indices: Vec<usize>,
    pub canonical_ids: Vec<CanonicalId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_strings_includes_main_label_first() {
        let entry = CanonicalEntry {
            id: CanonicalId(1),
            main_label: "Ecole Superieure de Physique et Chimie Industrielles".into(),
            aliases: vec!["ESPCI".into()],
            ..Default::default()
        };
        let v = entry.variant_strings();
        assert_eq!(v[0], entry.main_label);
        assert!(v.contains(&"ESPCI"));
    }

    #[test]
    fn test_source_item_new_defaults() {
        let item = SourceItem::new("doc1", "Nanovation SARL");
        assert_eq!(item.doc_id, "doc1");
        assert!(item.variants.is_empty());
        assert!(item.acros.is_empty());
    }
}
