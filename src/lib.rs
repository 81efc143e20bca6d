#![deny(missing_docs)]
#![allow(clippy::type_complexity)]
#![warn(clippy::unnecessary_to_owned)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::manual_string_new)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

//! Lossless YAML field patching and release version bumps.
//!
//! Documents are parsed into a [rowan] syntax tree that keeps every byte of
//! the input, so fields can be rewritten in place without disturbing
//! comments, quoting or key order.

mod bump;
pub mod cli;
mod error;
mod lex;
mod nested;
mod parse;
mod scalar;
mod value;
mod yaml;

pub use bump::{
    branch_version, next_minor, parse_version, previous_minor, release_version, skip_range,
    BumpError, BumpPlan, FieldUpdate,
};
pub use error::{YamlError, YamlResult};
pub use lex::{lex, SyntaxKind};
pub use nested::{FieldPath, MissingField};
pub use parse::Parse;
pub use rowan::TextRange;
pub use scalar::{ScalarStyle, ScalarType, ScalarValue};
pub use value::YamlValue;
pub use yaml::{
    Document, Lang, Mapping, MappingEntry, Scalar, Sequence, SequenceEntry, SyntaxNode, Yaml,
};

/// A positioned parse error containing location information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionedParseError {
    /// The error message
    pub message: String,
    /// The text range where the error occurred
    pub range: rowan::TextRange,
    /// Optional error code for categorization
    pub code: Option<String>,
}

impl std::fmt::Display for PositionedParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PositionedParseError {}

/// List of encountered syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError(pub Vec<String>);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl std::error::Error for ParseError {}
