//! Immutable, Arrow-backed table model for the fletcher pipeline.
//!
//! A [`Table`] is constructed once and never mutated in place: every pipeline
//! stage consumes a table and produces a new one. Column lookup by name goes
//! through a fixed name→index map built at construction, so renames and drops
//! are schema-level operations rather than data rewrites.
//!
//! The two table transforms the pipeline needs live here:
//! - [`prune`]: drop configured redundant columns.
//! - [`dictionary`]: rewrite low-cardinality string columns as
//!   dictionary-encoded (categorical) columns with minimal key width.

pub mod dictionary;
pub mod prune;
pub mod table;

pub use dictionary::{DictionaryOptions, decode_strings, encode_categoricals};
pub use table::Table;
