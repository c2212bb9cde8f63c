//! Error types shared across the crate.

use std::io;

use crate::components::ComponentId;

/// Failures surfaced by engine lookups and cell mutators.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("no component with id \"{0}\"")]
    ComponentNotFound(ComponentId),
    #[error("no component placed at ({x}, {y})")]
    NoComponentAt { x: usize, y: usize },
    #[error("cell ({x}, {y}) lies outside the {size}x{size} grid")]
    CellOutOfBounds { x: i64, y: i64, size: usize },
}

/// Failures while reading layout or scenario data.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid time label \"{0}\" (expected HH:MM)")]
    InvalidTimeLabel(String),
}
