//! Error types for channel construction, composition and parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, composing or decoding channels.
///
/// Composition failures are values of this type, never a fallback channel:
/// an operator either returns a freshly built channel or one of these.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The matrix has no rows or no columns.
    #[error("Channel cannot be empty")]
    EmptyChannel,

    /// Rows have different lengths.
    #[error("Ragged matrix: row {row} has {got} entries (expected {expected})")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Negative probability encountered. `col` is `None` for prior entries.
    #[error("Negative probability at row {row}, column {col:?}")]
    NegativeProbability { row: usize, col: Option<usize> },

    /// NaN or infinite entry. `col` is `None` for prior entries.
    #[error("Non-finite probability at row {row}, column {col:?}")]
    NonFinite { row: usize, col: Option<usize> },

    /// A matrix row doesn't sum to 1.
    #[error("Row {row} not normalized: sum = {sum} (expected 1.0)")]
    RowNotNormalized { row: usize, sum: f64 },

    /// The prior doesn't sum to 1.
    #[error("Distribution not normalized: sum = {sum} (expected 1.0)")]
    NotNormalized { sum: f64 },

    /// Dimension mismatch at an operator boundary.
    #[error("Shape mismatch in {op}: expected {expected}, got {got}")]
    ShapeMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    /// Operands don't share the same input alphabet.
    #[error("Incompatible channels for {op}: {reason}")]
    Incompatible { op: &'static str, reason: String },

    /// Mixing probability outside [0, 1].
    #[error("Invalid probability {p} (expected a value in [0, 1])")]
    InvalidProbability { p: f64 },

    /// Label absent from a name index.
    #[error("Label not found: {label:?}")]
    LabelNotFound { label: String },

    /// The same label appears twice in one alphabet.
    #[error("Duplicate label: {label:?}")]
    DuplicateLabel { label: String },

    /// Empty label or one containing whitespace.
    #[error("Invalid label {label:?}: labels must be non-empty and contain no whitespace")]
    InvalidLabel { label: String },

    /// Channel name that cannot be kept on one line of the text encoding.
    #[error("Invalid channel name {name:?}: names must not contain line breaks")]
    InvalidName { name: String },

    /// Wrong number of labels for a dimension.
    #[error("Expected {expected} labels, got {got}")]
    LabelCountMismatch { expected: usize, got: usize },

    /// Malformed serialized channel.
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Reading or writing a channel file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
