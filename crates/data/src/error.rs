//! Typed errors for the persistence layer.

use thiserror::Error;

/// Failures reading or writing the touch-history store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("touch store io failure at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not parse as touch history.
    #[error("touch store corrupt at {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
