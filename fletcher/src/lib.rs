//! fletcher: delimited text in, typed columnar data out.
//!
//! This crate is the primary entrypoint for the fletcher conversion
//! pipeline. It re-exports the user-facing API from the underlying
//! `fletcher-*` crates and provides the end-to-end orchestration that turns
//! a messy, multi-source CSV export into a compact Arrow IPC (Feather V2)
//! file.
//!
//! # Quick start
//!
//! ```no_run
//! use fletcher::{ConvertOptions, convert_csv_to_ipc};
//!
//! let options = ConvertOptions::default();
//! let report = convert_csv_to_ipc("requests.csv", "requests.arrow", &options)?;
//! println!("{} rows, {} columns", report.rows, report.columns);
//! # Ok::<(), fletcher::Error>(())
//! ```
//!
//! # Architecture
//!
//! The pipeline is a strictly sequential chain of stages, each consuming the
//! previous stage's output table:
//!
//! 1. **Raw read** (`fletcher-csv`): delimited text to raw string rows.
//! 2. **Inference** (`fletcher-csv`): per-column type and missingness.
//! 3. **Coercion** (`fletcher-csv`): typed arrays, stripped values,
//!    normalized names.
//! 4. **Pruning** (`fletcher-table`): drop configured redundant columns.
//! 5. **Dictionary encoding** (`fletcher-table`): categorical rewrite of
//!    low-cardinality string columns.
//! 6. **IPC write** (`fletcher-ipc`): the external columnar container.

mod convert;

pub use convert::{
    ConvertOptions, ConvertReport, SOURCE_METADATA_KEY, VERSION_METADATA_KEY, convert_csv_to_ipc,
    ingest_csv,
};
pub use fletcher_csv::{
    CsvIngestOptions, CsvReadOptions, CsvType, CsvWriteOptions, TimestampErrorPolicy,
    export_csv_to_path, export_csv_to_writer, read_csv_from_str, read_csv_to_table,
};
pub use fletcher_ipc::{
    CompressionCodec, IpcFileOptions, read_table, write_table, write_table_to_writer,
};
pub use fletcher_result::{Error, Result};
pub use fletcher_table::{DictionaryOptions, Table, decode_strings, encode_categoricals};
