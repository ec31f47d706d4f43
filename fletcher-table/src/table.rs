use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use fletcher_result::{Error, Result};

/// An immutable, in-memory columnar table.
///
/// Holds an Arrow schema plus one equal-length [`ArrayRef`] per field. The
/// name→index map is established once at construction; name lookups are a
/// pure function over that mapping.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    columns: Vec<ArrayRef>,
    name_index: FxHashMap<String, usize>,
}

impl Table {
    /// Build a table from a schema and its column arrays.
    ///
    /// Validates that the column count matches the schema, that all columns
    /// have equal length, and that field names are unique.
    pub fn try_new(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<Self> {
        if schema.fields().len() != columns.len() {
            return Err(Error::InvalidArgumentError(format!(
                "schema has {} fields but {} columns were provided",
                schema.fields().len(),
                columns.len()
            )));
        }

        if let Some(first) = columns.first() {
            let rows = first.len();
            for (field, column) in schema.fields().iter().zip(columns.iter()) {
                if column.len() != rows {
                    return Err(Error::InvalidArgumentError(format!(
                        "column '{}' has {} rows, expected {}",
                        field.name(),
                        column.len(),
                        rows
                    )));
                }
            }
        }

        let mut name_index = FxHashMap::default();
        for (idx, field) in schema.fields().iter().enumerate() {
            if name_index.insert(field.name().clone(), idx).is_some() {
                return Err(Error::InvalidArgumentError(format!(
                    "duplicate column name '{}'",
                    field.name()
                )));
            }
        }

        Ok(Self {
            schema,
            columns,
            name_index,
        })
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &ArrayRef {
        &self.columns[index]
    }

    /// Positional index of a column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Rebuild this table with an extra table-level metadata entry.
    ///
    /// Metadata is carried on the Arrow schema so it round-trips through the
    /// IPC container untouched. Rename-style operations like this never touch
    /// the column data.
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let mut metadata: HashMap<String, String> = self.schema.metadata().clone();
        metadata.insert(key.into(), value.into());
        let schema = Arc::new(Schema::new_with_metadata(
            self.schema.fields().clone(),
            metadata,
        ));
        Table::try_new(schema, self.columns.clone())
    }

    /// Convert into a single Arrow [`RecordBatch`] sharing the same buffers.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), self.columns.clone())?;
        Ok(batch)
    }

    /// Build a table from a record batch, tightening each field's nullability
    /// flag to whether the column actually contains a null.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns().iter())
            .map(|(field, column)| {
                field
                    .as_ref()
                    .clone()
                    .with_nullable(column.null_count() > 0)
            })
            .collect();
        let schema = Arc::new(Schema::new_with_metadata(
            fields,
            batch.schema().metadata().clone(),
        ));
        Table::try_new(schema, batch.columns().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::DataType;

    fn sample_table() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
        ];
        Table::try_new(schema, columns).expect("build table")
    }

    #[test]
    fn name_lookup_is_positional() {
        let table = sample_table();
        assert_eq!(table.column_index("id"), Some(0));
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("missing"), None);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn rejects_unequal_column_lengths() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Int64Array::from(vec![1])),
        ];
        assert!(matches!(
            Table::try_new(schema, columns),
            Err(Error::InvalidArgumentError(_))
        ));
    }

    #[test]
    fn rejects_duplicate_column_names() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("a", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![1])),
            Arc::new(Int64Array::from(vec![2])),
        ];
        assert!(Table::try_new(schema, columns).is_err());
    }

    #[test]
    fn metadata_survives_rebuild() {
        let table = sample_table()
            .with_metadata("source", "input.csv")
            .expect("metadata");
        assert_eq!(
            table.schema().metadata().get("source").map(String::as_str),
            Some("input.csv")
        );
    }

    #[test]
    fn record_batch_roundtrip_tightens_nullability() {
        let table = sample_table();
        let batch = table.to_record_batch().expect("batch");
        let rebuilt = Table::from_record_batch(&batch).expect("rebuild");
        // "id" has no nulls, "name" has one.
        assert!(!rebuilt.schema().field(0).is_nullable());
        assert!(rebuilt.schema().field(1).is_nullable());
    }
}
