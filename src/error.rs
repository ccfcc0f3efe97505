//! Errors for the fallible edges of the crate: preset and map import.
//! Generation itself never fails.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map has no tiles")]
    EmptyMap,
    #[error("column {column} has {found} tiles, expected {expected}")]
    RaggedColumn {
        column: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid preset: {0}")]
    InvalidPreset(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
