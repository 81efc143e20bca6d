//! Error types for yaml-bump

use crate::nested::FieldPath;

/// Errors that can occur when working with YAML documents
#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    /// I/O error when reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error when parsing YAML
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    /// No entry exists at the given path
    #[error("Key not found: '{0}'")]
    KeyNotFound(FieldPath),

    /// The node at the path cannot hold the replacement (e.g. a list written over a string)
    #[error("Type mismatch at '{path}': {message}")]
    TypeMismatch {
        /// Path of the offending node
        path: FieldPath,
        /// What was found instead
        message: String,
    },

    /// A field path with no keys
    #[error("Invalid field path: {0:?}")]
    InvalidPath(String),
}

/// Result type for yaml-bump operations
pub type YamlResult<T> = Result<T, YamlError>;
