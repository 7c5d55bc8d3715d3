//! Error types for format construction.

use thiserror::Error;

/// Errors arising from format strings and mode-kind resolution.
///
/// These are recoverable: they reject an input tensor declaration and
/// surface to the caller of the compilation entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A format string contained a character outside the recognized codes.
    #[error("unknown format code '{code}' at position {position}")]
    UnknownCode { code: char, position: usize },

    /// A format tree referenced a mode kind absent from the registry.
    #[error("mode kind `{name}` is not registered")]
    UnregisteredKind { name: String },
}

/// Result type alias for format operations.
pub type FormatResult<T> = Result<T, FormatError>;
