//! Explicit engine configuration.
//!
//! The original Python selects its lookup backend and acronym/assignment
//! behavior via module-level globals (`LOOKUP_CLASS`, `REQUIRES_SHARED_PROPER_NOUN`,
//! ...) reassigned by hand before a run. Here that selection is a single value
//! threaded through every entry point instead.

use serde::{Deserialize, Serialize};

/// Which approximate-match backend C3 uses to shortlist canonical terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupBackend {
    /// Finite-state substring index, edit-distance bounded.
    Fss,
    /// Levenshtein-ratio comparison against every indexed phrase.
    TokenRatio,
    /// Sparse character n-gram postings (prefix + rarest-k).
    SparseNgram,
}

/// Which strategy C6 uses to turn scored candidates into one-to-one matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Walk source items in order, claim the best still-unclaimed candidate.
    Greedy,
    /// Solve a min-cost bipartite assignment over the whole block.
    MinCost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub lookup_backend: LookupBackend,
    pub keep_acronyms: bool,
    pub assignment_mode: AssignmentMode,
    pub require_shared_proper_noun: bool,
    pub min_string_score: u32,
    /// Block by country when true; a single global block otherwise.
    pub block_by_country: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookup_backend: LookupBackend::Fss,
            keep_acronyms: false,
            assignment_mode: AssignmentMode::Greedy,
            require_shared_proper_noun: false,
            min_string_score: 20,
            block_by_country: true,
        }
    }
}
