//! Delimited-text export of a finished table.
//!
//! The inverse of ingestion, used to verify that a conversion is idempotent:
//! exporting a table and re-running the pipeline on the result with the same
//! configuration must reproduce the table exactly. Dictionary columns are
//! decoded back to their raw strings before writing; missing values become
//! empty fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::DateTime;

use fletcher_result::{Error, Result};
use fletcher_table::{Table, decode_strings};

/// Configuration for writing delimited text.
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Write a header row with column names when true.
    pub include_header: bool,
    /// Delimiter to use between fields.
    pub delimiter: u8,
    /// Pattern used to format timestamp values; must match the pattern the
    /// file will be re-ingested with for round-trips to hold.
    pub date_pattern: String,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: b',',
            date_pattern: "%m/%d/%Y %I:%M:%S %p".to_string(),
        }
    }
}

pub fn export_csv_to_path<C: AsRef<Path>>(
    table: &Table,
    csv_path: C,
    options: &CsvWriteOptions,
) -> Result<()> {
    let file = File::create(csv_path.as_ref())?;
    let mut writer = BufWriter::new(file);
    export_csv_to_writer(table, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

pub fn export_csv_to_writer<W: Write>(
    table: &Table,
    writer: &mut W,
    options: &CsvWriteOptions,
) -> Result<()> {
    let delim = options.delimiter as char;
    let schema = table.schema();

    // Dictionary columns write their decoded strings.
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.num_columns());
    for column in table.columns() {
        columns.push(decode_strings(column)?);
    }

    if options.include_header {
        let header: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| quote_field(f.name(), delim))
            .collect();
        writeln!(writer, "{}", header.join(&delim.to_string()))?;
    }

    for row in 0..table.num_rows() {
        let mut cells = Vec::with_capacity(columns.len());
        for column in &columns {
            let cell = format_cell(column, row, &options.date_pattern)?;
            cells.push(quote_field(&cell, delim));
        }
        writeln!(writer, "{}", cells.join(&delim.to_string()))?;
    }

    Ok(())
}

fn format_cell(column: &ArrayRef, row: usize, pattern: &str) -> Result<String> {
    if column.is_null(row) {
        return Ok(String::new());
    }

    macro_rules! primitive {
        ($ty:ty) => {{
            let array = column
                .as_any()
                .downcast_ref::<$ty>()
                .ok_or_else(|| Error::Internal("column did not downcast".into()))?;
            array.value(row).to_string()
        }};
    }

    let text = match column.data_type() {
        DataType::Boolean => {
            let array = column
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| Error::Internal("column did not downcast".into()))?;
            if array.value(row) { "true" } else { "false" }.to_string()
        }
        DataType::Int8 => primitive!(Int8Array),
        DataType::Int16 => primitive!(Int16Array),
        DataType::Int32 => primitive!(Int32Array),
        DataType::Int64 => primitive!(Int64Array),
        DataType::Float32 => {
            let array = column
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| Error::Internal("column did not downcast".into()))?;
            format_float(array.value(row) as f64)
        }
        DataType::Float64 => {
            let array = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::Internal("column did not downcast".into()))?;
            format_float(array.value(row))
        }
        DataType::Timestamp(TimeUnit::Microsecond, None) => {
            let array = column
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| Error::Internal("column did not downcast".into()))?;
            let micros = array.value(row);
            let ts = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| Error::Internal(format!("timestamp out of range: {micros}")))?;
            ts.naive_utc().format(pattern).to_string()
        }
        DataType::Utf8 => {
            let array = column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::Internal("column did not downcast".into()))?;
            array.value(row).to_string()
        }
        other => {
            return Err(Error::InvalidArgumentError(format!(
                "cannot export column of type {other:?} as CSV"
            )));
        }
    };
    Ok(text)
}

/// Format a float so that whole values keep a decimal point and re-ingest as
/// floats rather than integers.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn quote_field(value: &str, delim: char) -> String {
    if value.contains(delim) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
