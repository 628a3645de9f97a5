//! Error type shared by the markup, filter and chart layers
//!
//! The sparkline renderer itself never fails: a host without 2D drawing
//! support is reported as [`crate::sparkline::RenderOutcome::Unsupported`],
//! not as an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Markup error at byte {position}: {message}")]
    Markup { position: u64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid run datetime '{0}'")]
    Date(String),

    #[error("Run detail response contains no runs")]
    EmptyRuns,
}

pub type Result<T> = std::result::Result<T, Error>;
