//! Closed error enum for the engine's fallible boundaries.
//!
//! Exception-style control flow in the original Python (`IOError`, `RuntimeError`
//! raised from deep inside catalog loading) is re-expressed here as a result type
//! propagated with `?`. Non-fatal conditions (`BlockMissing`, `EmptyCandidates`)
//! are constructed for logging at their call sites; callers are not required to
//! propagate them, since the engine never lets them escape to the host as a hard
//! failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("catalog integrity violation: {0}")]
    CatalogIntegrity(String),

    #[error("input decode error: {0}")]
    InputDecode(String),

    #[error("no reference block for key {0:?}")]
    BlockMissing(String),

    #[error("empty candidate set for source item {0:?}")]
    EmptyCandidates(String),
}

pub type Result<T> = std::result::Result<T, LinkError>;
