use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all fletcher operations.
///
/// Errors propagate upward through the call stack with the `?` operator. The
/// two input-defect variants ([`Error::MalformedRow`] and
/// [`Error::TypeCoercion`]) carry enough context for an operator to locate the
/// offending cell, edit the run configuration (add a missing-value spelling,
/// relax a forced type), and rerun the conversion. There is no retry logic in
/// the pipeline itself; this is an offline batch transform.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file or stream operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow library error during columnar data operations.
    ///
    /// Raised when building Arrow arrays, assembling record batches, or
    /// reading/writing the IPC container.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Structural defect in the delimited input: a data row's field count
    /// differs from the header's.
    ///
    /// `row` is the 1-based data row number (the header is not counted).
    /// Structural errors abort the run immediately; no partial table is
    /// produced.
    #[error("malformed row {row}: expected {expected} fields, found {found}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A non-missing value could not be parsed under its resolved type.
    ///
    /// Only raised for user-forced column types (or forced timestamp columns
    /// under the `Error` policy). Inferred types demote to a weaker type
    /// instead of failing, so by the time values are coerced every inferred
    /// column is guaranteed to parse.
    #[error("column '{column}', row {row}: cannot parse {value:?} as {target}")]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
        target: String,
    },

    /// Invalid user input or API parameter.
    ///
    /// Bad configuration values, references to unknown column names, empty
    /// inputs where content is required. Fix the input and retry.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// Should never occur during normal operation.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a [`Error::TypeCoercion`] for a cell that failed to parse.
    ///
    /// `row` is the 1-based data row index of the offending value.
    #[inline]
    pub fn coercion(
        column: impl Into<String>,
        row: usize,
        value: impl Into<String>,
        target: impl fmt::Display,
    ) -> Self {
        Error::TypeCoercion {
            column: column.into(),
            row,
            value: value.into(),
            target: target.to_string(),
        }
    }

    /// Create an [`Error::Internal`] from any displayable error.
    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
