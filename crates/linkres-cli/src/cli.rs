//! Argument parsing (§6): one subcommand per operation mode, sharing a
//! common set of catalog/input/output flags via `#[command(flatten)]`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use linkres_core::{AssignmentMode, EngineConfig, LookupBackend};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "linkres")]
#[command(about = "Link noisy free-text mentions to canonical catalog entries", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise the tracing filter (repeatable: -v for DEBUG, -vv for TRACE).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Emit ranked candidates per source item, without one-to-one assignment.
    Link(LinkArgs),
    /// Resolve every source item to at most one canonical entry (one-to-one).
    Assign(AssignArgs),
    /// Harvest bracketed acronyms from a source file and rank their expansions.
    CollectExpansions(CollectExpansionsArgs),
    /// List reference aliases shared by more than one canonical entry.
    ShowAmbiguous(AmbiguousArgs),
    /// Rewrite the reference catalog with ambiguous aliases removed.
    DeleteAmbiguous(AmbiguousArgs),
    /// List source rows whose label has no token surviving normalization.
    ShowUnexpected(UnexpectedArgs),
    /// Rewrite the source file with unexpected rows removed.
    DeleteUnexpected(UnexpectedArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Fss,
    TokenRatio,
    SparseNgram,
}

impl From<BackendArg> for LookupBackend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Fss => LookupBackend::Fss,
            BackendArg::TokenRatio => LookupBackend::TokenRatio,
            BackendArg::SparseNgram => LookupBackend::SparseNgram,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AssignmentArg {
    Greedy,
    MinCost,
}

impl From<AssignmentArg> for AssignmentMode {
    fn from(a: AssignmentArg) -> Self {
        match a {
            AssignmentArg::Greedy => AssignmentMode::Greedy,
            AssignmentArg::MinCost => AssignmentMode::MinCost,
        }
    }
}

/// Flags shared by `link` and `assign`.
#[derive(Args)]
pub struct CommonArgs {
    /// Reference catalog file: pipe-separated, column 1 main label, columns 2.. aliases.
    #[arg(long)]
    pub reference: PathBuf,

    /// Source input file: CSV or TSV with a header row.
    #[arg(long)]
    pub input: PathBuf,

    /// Output file; defaults to stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Synonym file: pipe-separated, column 1 canonical form, column 2 alternative.
    #[arg(long)]
    pub synonyms: Option<PathBuf>,

    /// Alias sidecar: CSV rows of (grid_id, alias).
    #[arg(long)]
    pub aliases: Option<PathBuf>,

    /// Localized-label sidecar: CSV rows of (grid_id, iso639, label).
    #[arg(long)]
    pub translations: Option<PathBuf>,

    /// Acronym sidecar: CSV rows of (grid_id, acronym).
    #[arg(long)]
    pub acronym_sidecar: Option<PathBuf>,

    /// Link sidecar: CSV rows of (grid_id, url).
    #[arg(long)]
    pub links: Option<PathBuf>,

    /// Relationship sidecar: CSV rows of (grid_id, related_grid_id, Parent|Child).
    #[arg(long)]
    pub relationships: Option<PathBuf>,

    /// Keep acronyms verbatim during normalization instead of case-folding them.
    #[arg(long)]
    pub acronyms: bool,

    /// Print only a one-line summary instead of per-row output.
    #[arg(long)]
    pub stats: bool,

    /// Disable country-based blocking; treat the whole input as one block.
    #[arg(long)]
    pub no_country_block: bool,

    /// Approximate-match backend used to shortlist canonical terms.
    #[arg(long, value_enum, default_value_t = BackendArg::Fss)]
    pub backend: BackendArg,

    /// Floor below which an item-entry pair is discarded.
    #[arg(long, default_value_t = linkres_core::config::EngineConfig::default().min_string_score)]
    pub min_score: u32,
}

impl CommonArgs {
    pub fn block_by_country(&self) -> bool {
        !self.no_country_block
    }
}

#[derive(Args)]
pub struct LinkArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl LinkArgs {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            lookup_backend: self.common.backend.into(),
            keep_acronyms: self.common.acronyms,
            min_string_score: self.common.min_score,
            block_by_country: self.common.block_by_country(),
            ..Default::default()
        }
    }
}

#[derive(Args)]
pub struct AssignArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Assignment strategy used to turn scored candidates into one-to-one matches.
    #[arg(long, value_enum, default_value_t = AssignmentArg::Greedy)]
    pub assignment: AssignmentArg,

    /// Require a shared capitalized token between item and entry before accepting a match.
    #[arg(long)]
    pub require_shared_proper_noun: bool,
}

impl AssignArgs {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            lookup_backend: self.common.backend.into(),
            keep_acronyms: self.common.acronyms,
            assignment_mode: self.assignment.into(),
            require_shared_proper_noun: self.require_shared_proper_noun,
            min_string_score: self.common.min_score,
            block_by_country: self.common.block_by_country(),
        }
    }
}

#[derive(Args)]
pub struct CollectExpansionsArgs {
    /// Source input file: CSV or TSV with a header row.
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct AmbiguousArgs {
    /// Reference catalog file: pipe-separated, column 1 main label, columns 2.. aliases.
    #[arg(long)]
    pub reference: PathBuf,

    /// Output file for `delete-ambiguous`; defaults to stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct UnexpectedArgs {
    /// Source input file: CSV or TSV with a header row.
    #[arg(long)]
    pub input: PathBuf,

    /// Output file for `delete-unexpected`; defaults to stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
