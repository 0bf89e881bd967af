//! Error taxonomy for the crate's I/O and validation boundaries.
//!
//! Per-tick kernel operations are total (§7): they never return `Result`.
//! `Result` only appears where the crate crosses an edge it does not fully
//! control — parsing a layout file, or checking sweep preconditions before a
//! run starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout RON: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize layout RON: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid venue geometry: {0}")]
    InvalidGeometry(String),
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("venue needs at least one entrance and one exit to sweep")]
    NoEntrancesOrExits,

    #[error("sweep bounds are invalid: minN={min_n}, maxN={max_n}, step={step}")]
    InvalidBounds { min_n: u32, max_n: u32, step: u32 },
}
