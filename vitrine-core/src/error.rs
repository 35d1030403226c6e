use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single classification request. Contained by the debouncer.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("classifier transport failed: {0}")]
    Transport(String),
    #[error("classifier response malformed: {0}")]
    Malformed(String),
    #[error("classifier returned no results")]
    Empty,
}

/// Catalog could not be built. Fatal at start-up.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog must be a JSON object mapping labels to product indices")]
    NotAnObject,
    #[error("catalog entry {label:?} is invalid: {reason}")]
    InvalidEntry { label: String, reason: String },
    #[error("idle label {0:?} cannot be mapped to a product")]
    IdleLabelMapped(String),
    #[error("labels {first:?} and {second:?} both map to product {index}")]
    DuplicateIndex {
        index: usize,
        first: String,
        second: String,
    },
}
