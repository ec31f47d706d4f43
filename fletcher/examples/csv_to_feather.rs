//! Convert a delimited export into a compressed Arrow IPC file.
//!
//! Usage:
//!   cargo run --example csv_to_feather -- <input.csv[.gz]> <output.arrow> \
//!     [codec:none|lz4|zstd] [drop_column ...]
//!
//! Example:
//!   cargo run --example csv_to_feather -- requests.csv requests.arrow zstd location
//!
//! Notes:
//!   - Types and missing-value tokens are inferred with the default
//!     configuration; edit `options` below to add discovered spellings.
//!   - `RUST_LOG=debug` shows per-stage progress.

#![forbid(unsafe_code)]

use std::env;
use std::process::ExitCode;

use fletcher::{CompressionCodec, ConvertOptions, convert_csv_to_ipc};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (input, output),
        _ => {
            eprintln!("usage: csv_to_feather <input.csv[.gz]> <output.arrow> [codec] [drop ...]");
            return ExitCode::FAILURE;
        }
    };

    let codec = match args.next().as_deref() {
        None | Some("none") => CompressionCodec::None,
        Some("lz4") => CompressionCodec::Lz4,
        Some("zstd") => CompressionCodec::Zstd,
        Some(other) => {
            eprintln!("unknown codec '{other}' (expected none, lz4, or zstd)");
            return ExitCode::FAILURE;
        }
    };

    let options = ConvertOptions {
        compression_codec: codec,
        columns_to_drop: args.collect(),
        ..Default::default()
    };

    match convert_csv_to_ipc(&input, &output, &options) {
        Ok(report) => {
            println!(
                "{input} -> {output}: {} rows, {} columns ({} dictionary-encoded)",
                report.rows,
                report.columns,
                report.dictionary_columns.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("conversion failed: {err}");
            ExitCode::FAILURE
        }
    }
}
