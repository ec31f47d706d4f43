//! Dictionary (categorical) encoding for low-cardinality string columns.
//!
//! A string column whose distinct non-null count falls below the configured
//! threshold is rewritten as an Arrow [`DictionaryArray`]: a deduplicated
//! levels array in first-occurrence order plus a per-row key array in the
//! smallest signed width that covers the level count. Missing values stay in
//! the validity bitmap and never occupy a key. Encoding is reversible and
//! never changes cardinality or row order.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray, StringDictionaryBuilder};
use arrow::compute::cast;
use arrow::datatypes::{
    ArrowDictionaryKeyType, DataType, Field, Int8Type, Int16Type, Int32Type, Schema,
};
use rustc_hash::FxHashSet;

use fletcher_result::{Error, Result};

use crate::table::Table;

/// Controls which string columns get dictionary-encoded.
#[derive(Debug, Clone)]
pub struct DictionaryOptions {
    /// Encode a string column when its distinct non-null count is strictly
    /// below this threshold.
    pub cardinality_threshold: usize,
    /// Columns to encode regardless of cardinality.
    pub force_columns: Vec<String>,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            cardinality_threshold: 50,
            force_columns: Vec::new(),
        }
    }
}

/// Rewrite eligible string columns of `table` as dictionary columns.
pub fn encode_categoricals(table: &Table, options: &DictionaryOptions) -> Result<Table> {
    let forced: FxHashSet<&str> = options.force_columns.iter().map(String::as_str).collect();
    for name in &forced {
        match table.column_by_name(name) {
            None => {
                return Err(Error::InvalidArgumentError(format!(
                    "cannot dictionary-encode unknown column '{name}'"
                )));
            }
            Some(column) if column.data_type() != &DataType::Utf8 => {
                return Err(Error::InvalidArgumentError(format!(
                    "cannot dictionary-encode non-string column '{name}' ({:?})",
                    column.data_type()
                )));
            }
            Some(_) => {}
        }
    }

    let schema = table.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(schema.fields().len());

    for (field, column) in schema.fields().iter().zip(table.columns().iter()) {
        if field.data_type() != &DataType::Utf8 {
            fields.push(field.clone());
            columns.push(Arc::clone(column));
            continue;
        }

        let values = column
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| Error::Internal("Utf8 column did not downcast".into()))?;

        // An all-null column has nothing to deduplicate; leave it as the
        // nullable string the inference policy assigned.
        let distinct = distinct_count(values);
        let eligible = distinct > 0
            && (forced.contains(field.name().as_str()) || distinct < options.cardinality_threshold);
        if !eligible {
            fields.push(field.clone());
            columns.push(Arc::clone(column));
            continue;
        }

        tracing::debug!(
            column = field.name().as_str(),
            distinct,
            "dictionary-encoding string column"
        );

        // Smallest signed key width whose positive range covers the level
        // count, with the missing sentinel reserved outside key space.
        let (key_type, encoded) = if distinct <= i8::MAX as usize {
            (DataType::Int8, encode_column::<Int8Type>(values)?)
        } else if distinct <= i16::MAX as usize {
            (DataType::Int16, encode_column::<Int16Type>(values)?)
        } else {
            (DataType::Int32, encode_column::<Int32Type>(values)?)
        };

        let data_type = DataType::Dictionary(Box::new(key_type), Box::new(DataType::Utf8));
        fields.push(Arc::new(
            Field::new(field.name(), data_type, values.null_count() > 0)
                .with_metadata(field.metadata().clone()),
        ));
        columns.push(encoded);
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Table::try_new(schema, columns)
}

/// Decode any dictionary column back to plain strings.
///
/// Non-dictionary columns are returned unchanged. Used by the CSV exporter
/// and by round-trip verification.
pub fn decode_strings(column: &ArrayRef) -> Result<ArrayRef> {
    match column.data_type() {
        DataType::Dictionary(_, value_type) if value_type.as_ref() == &DataType::Utf8 => {
            let decoded = cast(column, &DataType::Utf8)?;
            Ok(decoded)
        }
        _ => Ok(Arc::clone(column)),
    }
}

fn distinct_count(values: &StringArray) -> usize {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for value in values.iter().flatten() {
        seen.insert(value);
    }
    seen.len()
}

fn encode_column<K: ArrowDictionaryKeyType>(values: &StringArray) -> Result<ArrayRef> {
    let mut builder = StringDictionaryBuilder::<K>::new();
    for value in values.iter() {
        match value {
            Some(v) => {
                builder.append(v)?;
            }
            None => builder.append_null(),
        }
    }
    Ok(Arc::new(builder.finish()))
}
