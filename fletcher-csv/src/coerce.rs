//! Coercion and normalization.
//!
//! Applies each column's resolved type, reparsing every value into Arrow
//! builders, stripping whitespace from string values, and rewriting column
//! names into an identifier-safe alphabet. The output is the finished,
//! immutable [`Table`]; each field's nullability flag reflects whether the
//! built column actually contains a null.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float32Builder, Float64Builder, Int8Builder, Int16Builder,
    Int32Builder, Int64Builder, StringBuilder, TimestampMicrosecondBuilder,
};
use arrow::datatypes::{Field, Schema};
use rustc_hash::FxHashSet;

use fletcher_result::{Error, Result};
use fletcher_table::Table;

use crate::inference::{
    ColumnPlan, MissingTokens, parse_bool, parse_float, parse_int, parse_timestamp,
};
use crate::{CsvIngestOptions, CsvType, RawRows, TimestampErrorPolicy};

pub(crate) fn build_table(
    rows: &RawRows,
    plans: &[ColumnPlan],
    options: &CsvIngestOptions,
) -> Result<Table> {
    let tokens = MissingTokens::from_options(options);
    let names = resolve_names(&rows.header, options.normalize_names);

    let mut fields = Vec::with_capacity(plans.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(plans.len());
    for (col_idx, plan) in plans.iter().enumerate() {
        let array = build_column(rows, col_idx, plan, &tokens, options)?;
        fields.push(Field::new(
            &names[col_idx],
            array.data_type().clone(),
            array.null_count() > 0,
        ));
        columns.push(array);
    }

    tracing::debug!(
        rows = rows.num_rows(),
        columns = plans.len(),
        "coerced typed columns"
    );
    let schema = Arc::new(Schema::new(fields));
    Table::try_new(schema, columns)
}

/// Error for a value that failed its resolved type.
///
/// Inference requires 100% of non-missing values to parse, so a failure on an
/// inferred column means the two stages disagree — a bug, not user input.
fn coercion_failure(plan: &ColumnPlan, row_idx: usize, value: &str) -> Error {
    if plan.forced {
        Error::coercion(&plan.name, row_idx + 1, value, plan.ty)
    } else {
        Error::Internal(format!(
            "inferred type {} for column '{}' rejected value {:?} at row {}",
            plan.ty,
            plan.name,
            value,
            row_idx + 1
        ))
    }
}

fn build_column(
    rows: &RawRows,
    col_idx: usize,
    plan: &ColumnPlan,
    tokens: &MissingTokens,
    options: &CsvIngestOptions,
) -> Result<ArrayRef> {
    let name = plan.name.as_str();
    let rows_iter = || {
        rows.rows
            .iter()
            .map(move |row| row[col_idx].as_str())
            .enumerate()
    };

    macro_rules! numeric_column {
        ($builder:ty, $parse:expr, $convert:expr) => {{
            let mut builder = <$builder>::with_capacity(rows.num_rows());
            for (row_idx, raw) in rows_iter() {
                let stripped = raw.trim();
                if tokens.is_missing(name, stripped) {
                    builder.append_null();
                } else {
                    match $parse(stripped) {
                        Some(v) => builder.append_value($convert(v)),
                        None => return Err(coercion_failure(plan, row_idx, stripped)),
                    }
                }
            }
            Ok(Arc::new(builder.finish()) as ArrayRef)
        }};
    }

    match plan.ty {
        CsvType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(rows.num_rows());
            for (row_idx, raw) in rows_iter() {
                let stripped = raw.trim();
                if tokens.is_missing(name, stripped) {
                    builder.append_null();
                } else {
                    match parse_bool(stripped) {
                        Some(v) => builder.append_value(v),
                        None => return Err(coercion_failure(plan, row_idx, stripped)),
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        CsvType::Int8 => numeric_column!(Int8Builder, parse_int_width::<i8>, |v| v),
        CsvType::Int16 => numeric_column!(Int16Builder, parse_int_width::<i16>, |v| v),
        CsvType::Int32 => numeric_column!(Int32Builder, parse_int_width::<i32>, |v| v),
        CsvType::Int64 => numeric_column!(Int64Builder, parse_int, |v| v),
        CsvType::Float32 => numeric_column!(Float32Builder, parse_float, |v| v as f32),
        CsvType::Float64 => numeric_column!(Float64Builder, parse_float, |v| v),
        CsvType::Timestamp => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(rows.num_rows());
            for (row_idx, raw) in rows_iter() {
                let stripped = raw.trim();
                if tokens.is_missing(name, stripped) {
                    builder.append_null();
                    continue;
                }
                match parse_timestamp(stripped, &options.date_pattern) {
                    Some(ndt) => builder.append_value(ndt.and_utc().timestamp_micros()),
                    None if plan.forced
                        && options.on_timestamp_error == TimestampErrorPolicy::Null =>
                    {
                        builder.append_null();
                    }
                    None => return Err(coercion_failure(plan, row_idx, stripped)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        CsvType::Utf8 => {
            let mut builder = StringBuilder::new();
            for (_, raw) in rows_iter() {
                let stripped = raw.trim();
                if tokens.is_missing(name, stripped) {
                    builder.append_null();
                } else if options.strip_whitespace {
                    builder.append_value(stripped);
                } else {
                    builder.append_value(raw);
                }
            }
            Ok(Arc::new(builder.finish()))
        }
    }
}

fn parse_int_width<T: TryFrom<i64>>(s: &str) -> Option<T> {
    parse_int(s).and_then(|v| T::try_from(v).ok())
}

/// Resolve final column names: optional normalization plus collision
/// suffixing, preserving header order.
pub(crate) fn resolve_names(header: &[String], normalize: bool) -> Vec<String> {
    let mut taken: FxHashSet<String> = FxHashSet::default();
    let mut out = Vec::with_capacity(header.len());
    for raw in header {
        let base = if normalize {
            normalize_name(raw)
        } else {
            raw.clone()
        };
        let mut name = base.clone();
        let mut suffix = 2usize;
        while !taken.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        out.push(name);
    }
    out
}

/// Rewrite a header into a lowercase identifier: characters outside
/// `[a-z0-9_]` become `_`, runs collapse, edge underscores are trimmed.
fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for c in raw.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "col".to_string()
    } else {
        trimmed.to_string()
    }
}
