//! Common error types for the article fingerprinter

use thiserror::Error;

/// Common result type for fingerprinting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the workspace
///
/// Unavailable or discarded extractor outputs are not errors; they are
/// reported in run statistics. Only the variants below stop a run.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Article metadata is missing a required identity field
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// No extractor output was supplied at all
    #[error("No extraction sources supplied for {url}")]
    NoSources { url: String },

    /// A single extractor failed (converted to an error marker at the boundary)
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
