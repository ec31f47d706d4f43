//! Configuration-driven column removal.
//!
//! The pipeline treats redundancy elimination as a seam, not an inference
//! engine: an operator determines that a column is derivable from others
//! (e.g. a combined location string re-derivable from two coordinate
//! columns) and lists it in the configuration. Nothing here tries to detect
//! functional dependencies automatically.

use std::sync::Arc;

use arrow::datatypes::Schema;
use rustc_hash::FxHashSet;

use fletcher_result::{Error, Result};

use crate::table::Table;

impl Table {
    /// Produce a new table without the named columns.
    ///
    /// Unknown names are an error rather than a no-op so that configuration
    /// typos surface instead of silently keeping a redundant column. Row
    /// count and the remaining columns' values are unchanged; schema
    /// metadata is preserved.
    pub fn drop_columns(&self, names: &[String]) -> Result<Table> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        let mut to_drop: FxHashSet<&str> = FxHashSet::default();
        for name in names {
            if self.column_index(name).is_none() {
                return Err(Error::InvalidArgumentError(format!(
                    "cannot drop unknown column '{name}'"
                )));
            }
            to_drop.insert(name.as_str());
        }

        tracing::debug!(dropped = names.len(), "pruning redundant columns");

        let schema = self.schema();
        let mut fields = Vec::with_capacity(schema.fields().len() - to_drop.len());
        let mut columns = Vec::with_capacity(fields.capacity());
        for (field, column) in schema.fields().iter().zip(self.columns().iter()) {
            if to_drop.contains(field.name().as_str()) {
                continue;
            }
            fields.push(field.clone());
            columns.push(Arc::clone(column));
        }

        let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
        Table::try_new(schema, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field};

    fn location_table() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("location", DataType::Utf8, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from(vec![40.7, 40.8])),
            Arc::new(Float64Array::from(vec![-73.9, -74.0])),
            Arc::new(StringArray::from(vec!["(40.7, -73.9)", "(40.8, -74.0)"])),
        ];
        Table::try_new(schema, columns).expect("build table")
    }

    #[test]
    fn drops_configured_column() {
        let table = location_table();
        let pruned = table
            .drop_columns(&["location".to_string()])
            .expect("drop location");
        assert_eq!(pruned.num_columns(), 2);
        assert_eq!(pruned.num_rows(), 2);
        assert_eq!(pruned.column_index("location"), None);
        assert_eq!(pruned.column_index("latitude"), Some(0));
        assert_eq!(pruned.column_index("longitude"), Some(1));
    }

    #[test]
    fn empty_drop_list_is_a_no_op() {
        let table = location_table();
        let pruned = table.drop_columns(&[]).expect("no-op");
        assert_eq!(pruned.num_columns(), 3);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let table = location_table();
        let err = table
            .drop_columns(&["loc".to_string()])
            .expect_err("unknown column");
        assert!(matches!(err, Error::InvalidArgumentError(_)));
    }
}
