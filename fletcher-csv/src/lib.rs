//! Delimited-text ingestion for the fletcher pipeline.
//!
//! Three sequential stages turn a raw CSV/TSV export into a typed
//! [`fletcher_table::Table`]:
//!
//! 1. [`reader`] streams the (optionally gzip-compressed) file into raw
//!    string rows, failing fast on structural defects.
//! 2. [`inference`] decides each column's semantic type and which stripped
//!    literals denote missing values.
//! 3. [`coerce`] reparses every value under its resolved type, strips
//!    whitespace, and normalizes column identifiers.
//!
//! [`export`] writes a finished table back out as delimited text so a
//! conversion can be verified to be idempotent.

use std::fmt;

use arrow::datatypes::{DataType, TimeUnit};
use rustc_hash::FxHashMap;

pub mod coerce;
pub mod export;
pub mod inference;
pub mod ingest;
pub mod reader;

pub use export::{CsvWriteOptions, export_csv_to_path, export_csv_to_writer};
pub use ingest::{read_csv_from_str, read_csv_to_table};
pub use reader::RawRows;

/// Semantic column types the pipeline can resolve or be forced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsvType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Timezone-naive timestamp, microsecond precision, parsed against the
    /// single configured pattern.
    Timestamp,
    Utf8,
}

impl CsvType {
    pub fn to_arrow(self) -> DataType {
        match self {
            CsvType::Boolean => DataType::Boolean,
            CsvType::Int8 => DataType::Int8,
            CsvType::Int16 => DataType::Int16,
            CsvType::Int32 => DataType::Int32,
            CsvType::Int64 => DataType::Int64,
            CsvType::Float32 => DataType::Float32,
            CsvType::Float64 => DataType::Float64,
            CsvType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            CsvType::Utf8 => DataType::Utf8,
        }
    }
}

impl fmt::Display for CsvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CsvType::Boolean => "boolean",
            CsvType::Int8 => "int8",
            CsvType::Int16 => "int16",
            CsvType::Int32 => "int32",
            CsvType::Int64 => "int64",
            CsvType::Float32 => "float32",
            CsvType::Float64 => "float64",
            CsvType::Timestamp => "timestamp",
            CsvType::Utf8 => "utf8",
        };
        f.write_str(name)
    }
}

/// What to do when a value in a user-forced timestamp column does not match
/// the configured pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampErrorPolicy {
    /// Coerce the offending value to missing, silently.
    #[default]
    Null,
    /// Abort the run with a [`fletcher_result::Error::TypeCoercion`].
    Error,
}

/// Options for the raw reading stage.
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Treat the first row as column names when true; otherwise names are
    /// synthesized as `col_0`, `col_1`, ...
    pub has_header: bool,
    /// Field delimiter, typically `b','` or `b'\t'`.
    pub delimiter: u8,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
        }
    }
}

/// Full configuration for stages 1-3 of the pipeline.
///
/// Missing-token matching is exact (after whitespace stripping); the empty
/// string is always treated as missing regardless of configuration. The
/// global token set applies to every column unless a per-column override
/// replaces it.
#[derive(Debug, Clone)]
pub struct CsvIngestOptions {
    pub read: CsvReadOptions,
    /// Literal spellings of "missing" shared by all columns.
    pub missing_tokens: Vec<String>,
    /// Per-column replacements for the global token set, keyed by the
    /// original (pre-normalization) header name.
    pub per_column_missing_tokens: FxHashMap<String, Vec<String>>,
    /// The single strftime-style pattern every timestamp must match. One
    /// explicit pattern beats heuristic multi-format detection, which
    /// silently produces wrong dates.
    pub date_pattern: String,
    /// Choose the smallest signed integer width covering the observed range.
    pub downcast_integers: bool,
    /// Rewrite column names into a lowercase identifier-safe alphabet.
    pub normalize_names: bool,
    /// Strip leading/trailing whitespace from string values.
    pub strip_whitespace: bool,
    /// Forced types, keyed by the original header name. A non-missing value
    /// that fails a forced type aborts the run.
    pub column_type_overrides: FxHashMap<String, CsvType>,
    pub on_timestamp_error: TimestampErrorPolicy,
}

impl Default for CsvIngestOptions {
    fn default() -> Self {
        Self {
            read: CsvReadOptions::default(),
            // Spellings of "missing" observed across real multi-source
            // exports; the empty string always matches in addition to these.
            missing_tokens: vec![
                "NA".to_string(),
                "N/A".to_string(),
                "null".to_string(),
                "NULL".to_string(),
                "Unspecified".to_string(),
            ],
            per_column_missing_tokens: FxHashMap::default(),
            date_pattern: "%m/%d/%Y %I:%M:%S %p".to_string(),
            downcast_integers: true,
            normalize_names: true,
            strip_whitespace: true,
            column_type_overrides: FxHashMap::default(),
            on_timestamp_error: TimestampErrorPolicy::default(),
        }
    }
}
