//! End-to-end ingestion of a delimited file into a typed table.
//!
//! Runs the three in-crate stages sequentially: raw read, inference,
//! coercion. Each stage fully consumes its input before the next begins —
//! type inference must see every value in a column before any value is
//! finally coerced.

use std::path::Path;

use fletcher_result::Result;
use fletcher_table::Table;

use crate::{CsvIngestOptions, coerce, inference, reader};

/// Read a delimited file (plain or gzip-compressed) into a typed [`Table`].
pub fn read_csv_to_table<P: AsRef<Path>>(path: P, options: &CsvIngestOptions) -> Result<Table> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading delimited input");
    let rows = reader::read_raw(path, &options.read)?;
    finish_ingest(rows, options)
}

/// Ingest delimited text already held in memory. Used by round-trip
/// verification and tests.
pub fn read_csv_from_str(text: &str, options: &CsvIngestOptions) -> Result<Table> {
    let rows = reader::parse_str(text, &options.read)?;
    finish_ingest(rows, options)
}

fn finish_ingest(rows: reader::RawRows, options: &CsvIngestOptions) -> Result<Table> {
    tracing::debug!(
        rows = rows.num_rows(),
        columns = rows.num_columns(),
        "raw read complete"
    );
    let plans = inference::infer(&rows, options);
    coerce::build_table(&rows, &plans, options)
}
