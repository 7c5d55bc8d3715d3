//! Error types for lowering.

use thiserror::Error;

use tengen_format::FormatError;

/// Errors surfacing from the lowering driver.
///
/// All of these are recoverable: they reject the kernel description and
/// carry enough context to report the offending access or index.
#[derive(Error, Debug)]
pub enum LowerError {
    /// A tensor declaration carried an invalid format.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// An access applies the wrong number of index variables.
    #[error("access {access} has {got} indices but its format has {expected} levels")]
    ArityMismatch {
        access: String,
        expected: usize,
        got: usize,
    },

    /// An access repeats an index variable (diagonal access).
    #[error("access {access} repeats index variable '{index}'")]
    RepeatedIndex { access: String, index: char },

    /// The kernel needs an iteration structure the formats cannot
    /// provide.
    #[error("unsupported kernel structure: {reason}")]
    Unsupported { reason: String },
}

/// Result type alias for lowering operations.
pub type LowerResult<T> = Result<T, LowerError>;
