//! CLI-local error type, mapping every failure mode to one of the exit
//! codes of §6: 1 catalog error, 2 input error, 3 runtime failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Catalog(#[from] linkres_core::LinkError),

    #[error("failed to read {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Catalog(_) => 1,
            CliError::Input { .. } | CliError::Csv { .. } => 2,
            CliError::Runtime(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
