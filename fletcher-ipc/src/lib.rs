//! Arrow IPC boundary adapter.
//!
//! Serializes a finished [`Table`] into the Arrow IPC file container
//! (Feather V2) and reads it back. The wire format itself is external and
//! independently specified; this crate's obligations are only that the
//! schema round-trips exactly, nullability flags match actual null presence,
//! and compression is opt-in and lossless. The lz4/zstd codecs come from the
//! `arrow` crate's `ipc_compression` feature.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::ipc::CompressionType;
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::{FileWriter, IpcWriteOptions};
use arrow::record_batch::RecordBatch;

use fletcher_result::Result;
use fletcher_table::Table;

/// Block-compression codec applied per-buffer inside the IPC container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionCodec {
    #[default]
    None,
    Lz4,
    Zstd,
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionCodec::None => "none",
            CompressionCodec::Lz4 => "lz4",
            CompressionCodec::Zstd => "zstd",
        };
        f.write_str(name)
    }
}

impl CompressionCodec {
    fn to_arrow(self) -> Option<CompressionType> {
        match self {
            CompressionCodec::None => None,
            CompressionCodec::Lz4 => Some(CompressionType::LZ4_FRAME),
            CompressionCodec::Zstd => Some(CompressionType::ZSTD),
        }
    }
}

/// Options for writing the IPC file.
#[derive(Debug, Clone, Default)]
pub struct IpcFileOptions {
    pub codec: CompressionCodec,
}

/// Write `table` to `path` as an Arrow IPC file.
pub fn write_table<C: AsRef<Path>>(
    path: C,
    table: &Table,
    options: &IpcFileOptions,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_table_to_writer(&mut writer, table, options)?;
    writer.flush()?;
    Ok(())
}

/// Write `table` into an arbitrary sink as an Arrow IPC file.
pub fn write_table_to_writer<W: Write>(
    writer: W,
    table: &Table,
    options: &IpcFileOptions,
) -> Result<()> {
    tracing::debug!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        codec = %options.codec,
        "writing IPC file"
    );
    let batch = table.to_record_batch()?;
    let ipc_options = IpcWriteOptions::default().try_with_compression(options.codec.to_arrow())?;
    let schema = table.schema();
    let mut ipc_writer = FileWriter::try_new_with_options(writer, schema.as_ref(), ipc_options)?;
    ipc_writer.write(&batch)?;
    ipc_writer.finish()?;
    Ok(())
}

/// Read an Arrow IPC file back into a [`Table`].
///
/// Decompression is driven by the per-buffer markers in the container, so
/// callers do not name a codec here.
pub fn read_table<C: AsRef<Path>>(path: C) -> Result<Table> {
    let file = File::open(path.as_ref())?;
    read_table_from_reader(BufReader::new(file))
}

/// Read an Arrow IPC file from any seekable source.
pub fn read_table_from_reader<R: std::io::Read + Seek>(reader: R) -> Result<Table> {
    let reader = FileReader::try_new(reader, None)?;
    let schema = reader.schema();

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = if batches.is_empty() {
        RecordBatch::new_empty(schema)
    } else {
        concat_batches(&schema, &batches)?
    };
    Table::from_record_batch(&batch)
}
