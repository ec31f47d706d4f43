use crate::error::Error;

/// Result type alias used throughout fletcher.
///
/// Shorthand for `std::result::Result<T, Error>`. All fletcher operations
/// that can fail return this type.
pub type Result<T> = std::result::Result<T, Error>;
