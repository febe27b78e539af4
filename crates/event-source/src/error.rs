//! Error types for event sources.

use thiserror::Error;

/// Errors that can occur while configuring or iterating an event source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A column specification could not be tokenized.
    #[error("malformed column specification {spec:?} at byte {position}")]
    MalformedSpec {
        /// The offending specification string.
        spec: String,
        /// Byte offset where tokenization stopped making progress.
        position: usize,
    },

    /// The underlying adapter failed while records were being read.
    #[error("source read error: {0}")]
    SourceRead(String),

    /// A filter pattern failed to compile.
    #[error("invalid filter pattern {pattern:?}: {source}")]
    InvalidFilterPattern {
        /// The pattern as supplied by the caller.
        pattern: String,
        /// The compilation error reported by the regex engine.
        source: regex::Error,
    },

    /// A configuration value violates an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for event source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
