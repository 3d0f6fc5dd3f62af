//! Command-line surface for the entity resolution engine (C9). Owns the
//! process's only `main`, the only file handles, and the only
//! `std::process::exit` call, mapping `LinkError`/`CliError` variants to
//! the exit codes of §6.

mod cli;
mod commands;
mod error;
mod io;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: &Cli) -> error::Result<()> {
    match &cli.command {
        Commands::Link(args) => commands::link(args),
        Commands::Assign(args) => commands::assign(args),
        Commands::CollectExpansions(args) => commands::collect_expansions(args),
        Commands::ShowAmbiguous(args) => commands::show_ambiguous(args),
        Commands::DeleteAmbiguous(args) => commands::delete_ambiguous(args),
        Commands::ShowUnexpected(args) => commands::show_unexpected(args),
        Commands::DeleteUnexpected(args) => commands::delete_unexpected(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        tracing::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
