//! Error types and result definitions for the fletcher ingestion pipeline.
//!
//! All fletcher crates share a single error enum ([`Error`]) and result type
//! alias ([`Result<T>`]). A unified type keeps errors propagating naturally
//! with the `?` operator across crate boundaries while still allowing callers
//! to match on specific failure modes.
//!
//! # Error Categories
//!
//! - **I/O errors** ([`Error::Io`]): file access, stream consumption
//! - **Columnar format errors** ([`Error::Arrow`]): Arrow array/IPC failures
//! - **Structural input defects** ([`Error::MalformedRow`]): field-count
//!   mismatches in the delimited input; these abort the run with no partial
//!   table produced
//! - **Value-level defects** ([`Error::TypeCoercion`]): a non-missing value
//!   that cannot be parsed under a resolved or user-forced column type
//! - **API misuse** ([`Error::InvalidArgumentError`]): bad configuration,
//!   unknown column names
//! - **Internal errors** ([`Error::Internal`]): violated invariants, bugs

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
