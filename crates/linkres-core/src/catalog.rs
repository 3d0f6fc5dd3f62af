//! Build and enrich a `ReferenceCatalog` from already-parsed rows (C7).
//!
//! Grounded in `Referential.__init__`'s duplicate-label/id checks and the
//! sidecar-application methods implied by the original source's grid
//! alias/translation/acronym/link/relationship loaders.

use crate::error::{LinkError, Result};
use crate::model::{CanonicalEntry, CanonicalId, RelationshipKind};
use rustc_hash::FxHashMap;

/// Canonical entries plus the alias -> id inverse index, held read-only
/// after loading (§5).
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    entries: Vec<CanonicalEntry>,
    by_main_label: FxHashMap<String, CanonicalId>,
    by_alias: FxHashMap<String, CanonicalId>,
}

impl ReferenceCatalog {
    /// Build from already-split pipe-separated rows: column 0 the main
    /// label, columns 1.. aliases. Raises `CatalogIntegrity` on a duplicate
    /// main label.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<String>>) -> Result<Self> {
        let mut catalog = Self::default();
        for row in rows {
            let mut cols = row.into_iter();
            let main_label = cols.next().ok_or_else(|| {
                LinkError::CatalogIntegrity("row missing main label column".into())
            })?;
            if main_label.trim().is_empty() {
                return Err(LinkError::CatalogIntegrity("empty main label".into()));
            }
            if catalog.by_main_label.contains_key(&main_label) {
                return Err(LinkError::CatalogIntegrity(format!(
                    "duplicate main label: {main_label}"
                )));
            }
            let aliases: Vec<String> = cols.collect();
            let id = CanonicalId(catalog.entries.len() as u32);
            for alias in &aliases {
                catalog.by_alias.insert(alias.clone(), id);
            }
            catalog.by_main_label.insert(main_label.clone(), id);
            catalog.entries.push(CanonicalEntry {
                id,
                main_label,
                aliases,
                ..Default::default()
            });
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: CanonicalId) -> Option<&CanonicalEntry> {
        self.entries.get(id.0 as usize)
    }

    pub fn entries(&self) -> &[CanonicalEntry] {
        &self.entries
    }

    pub fn id_for_main_label(&self, label: &str) -> Option<CanonicalId> {
        self.by_main_label.get(label).copied()
    }

    fn entry_mut(&mut self, id: CanonicalId) -> Option<&mut CanonicalEntry> {
        self.entries.get_mut(id.0 as usize)
    }

    /// Apply `(grid_id, alias)` sidecar rows. An unknown grid id is a no-op.
    pub fn apply_aliases(&mut self, rows: impl IntoIterator<Item = (String, String)>) {
        for (grid_id, alias) in rows {
            let id = match self.resolve_grid_id(&grid_id) {
                Some(id) => id,
                None => continue,
            };
            self.by_alias.insert(alias.clone(), id);
            if let Some(entry) = self.entry_mut(id) {
                entry.aliases.push(alias);
            }
        }
    }

    /// Apply `(grid_id, iso639, label)` sidecar rows.
    pub fn apply_translations(&mut self, rows: impl IntoIterator<Item = (String, String, String)>) {
        for (grid_id, lang, label) in rows {
            let id = match self.resolve_grid_id(&grid_id) {
                Some(id) => id,
                None => continue,
            };
            if let Some(entry) = self.entry_mut(id) {
                entry.translations.insert(lang, label);
            }
        }
    }

    /// Apply `(grid_id, acronym)` sidecar rows.
    pub fn apply_acronyms(&mut self, rows: impl IntoIterator<Item = (String, String)>) {
        for (grid_id, acronym) in rows {
            let id = match self.resolve_grid_id(&grid_id) {
                Some(id) => id,
                None => continue,
            };
            if let Some(entry) = self.entry_mut(id) {
                entry.acronym = Some(acronym);
            }
        }
    }

    /// Apply `(grid_id, link)` sidecar rows.
    pub fn apply_links(&mut self, rows: impl IntoIterator<Item = (String, String)>) {
        for (grid_id, link) in rows {
            let id = match self.resolve_grid_id(&grid_id) {
                Some(id) => id,
                None => continue,
            };
            if let Some(entry) = self.entry_mut(id) {
                entry.links.push(link);
            }
        }
    }

    /// Apply `(grid_id, related_grid_id, relationship_type)` sidecar rows.
    /// A relationship naming an unknown grid id is a no-op, not an error.
    pub fn apply_relationships(
        &mut self,
        rows: impl IntoIterator<Item = (String, String, RelationshipKind)>,
    ) {
        for (grid_id, related, kind) in rows {
            let (Some(id), Some(related_id)) = (
                self.resolve_grid_id(&grid_id),
                self.resolve_grid_id(&related),
            ) else {
                continue;
            };
            match kind {
                RelationshipKind::Parent => {
                    if let Some(entry) = self.entry_mut(id) {
                        entry.parents.push(related_id);
                    }
                }
                RelationshipKind::Child => {
                    if let Some(entry) = self.entry_mut(id) {
                        entry.children.push(related_id);
                    }
                }
            }
        }
    }

    /// Look a grid identifier up either as an index-encoded id (`"grid/7"`)
    /// or by exact main-label match; unknown ids resolve to `None`.
    fn resolve_grid_id(&self, grid_id: &str) -> Option<CanonicalId> {
        if let Some(idx) = grid_id
            .strip_prefix("grid/")
            .and_then(|n| n.parse::<u32>().ok())
            && (idx as usize) < self.entries.len()
        {
            return Some(CanonicalId(idx));
        }
        self.by_main_label.get(grid_id).copied()
    }

    /// Walk ancestor edges breadth-first, guarding against cycles with a
    /// visited set (§9).
    pub fn traverse_ancestors(&self, start: CanonicalId) -> Vec<CanonicalId> {
        self.traverse(start, |e| &e.parents)
    }

    /// Walk descendant edges breadth-first, guarding against cycles.
    pub fn traverse_descendants(&self, start: CanonicalId) -> Vec<CanonicalId> {
        self.traverse(start, |e| &e.children)
    }

    fn traverse(
        &self,
        start: CanonicalId,
        edges: impl Fn(&CanonicalEntry) -> &Vec<CanonicalId>,
    ) -> Vec<CanonicalId> {
        let mut visited = rustc_hash::FxHashSet::default();
        let mut queue = std::collections::VecDeque::new();
        let mut out = Vec::new();
        queue.push_back(start);
        visited.insert(start);
        while let Some(current) = queue.pop_front() {
            if let Some(entry) = self.get(current) {
                for &next in edges(entry) {
                    if visited.insert(next) {
                        out.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_main_label_rejected() {
        let rows = vec![vec!["Chimie".to_string()], vec!["Chimie".to_string()]];
        let err = ReferenceCatalog::from_rows(rows).unwrap_err();
        assert!(matches!(err, LinkError::CatalogIntegrity(_)));
    }

    #[test]
    fn test_aliases_indexed() {
        let rows = vec![vec!["Chimie".to_string(), "Chemistry".to_string()]];
        let catalog = ReferenceCatalog::from_rows(rows).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].aliases, vec!["Chemistry".to_string()]);
    }

    #[test]
    fn test_unknown_relationship_grid_id_is_noop() {
        let rows = vec![vec!["Chimie".to_string()]];
        let mut catalog = ReferenceCatalog::from_rows(rows).unwrap();
        catalog.apply_relationships(vec![(
            "grid/0".to_string(),
            "grid/99".to_string(),
            RelationshipKind::Parent,
        )]);
        assert!(catalog.entries()[0].parents.is_empty());
    }

    #[test]
    fn test_traverse_ancestors_handles_cycle() {
        let rows = vec![vec!["A".to_string()], vec!["B".to_string()]];
        let mut catalog = ReferenceCatalog::from_rows(rows).unwrap();
        catalog.apply_relationships(vec![
            (
                "grid/0".to_string(),
                "grid/1".to_string(),
                RelationshipKind::Parent,
            ),
            (
                "grid/1".to_string(),
                "grid/0".to_string(),
                RelationshipKind::Parent,
            ),
        ]);
        let ancestors = catalog.traverse_ancestors(CanonicalId(0));
        assert_eq!(ancestors, vec![CanonicalId(1)]);
    }
}
