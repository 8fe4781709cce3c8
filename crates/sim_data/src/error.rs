//! Static-data loading errors.

use std::path::PathBuf;

/// Errors raised while loading static data from disk.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A data file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file was not valid JSON for its record type.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The data directory does not exist.
    #[error("data directory not found: {0}")]
    MissingDir(PathBuf),
}
