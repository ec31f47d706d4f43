//! Type and missingness inference.
//!
//! For each column the inferencer classifies the distinct non-missing values
//! in strict priority order: boolean, integer, floating-point, timestamp
//! against the configured pattern, with UTF-8 string as the universal
//! fallback. A column only takes a type when 100% of its non-missing values
//! parse under it; a single odd value demotes the whole column to the next
//! weaker type rather than raising an error.
//!
//! This is a two-pass design: pass one collects the distinct stripped values
//! per column (which also serves dictionary-eligibility and all-missing
//! detection), pass two classifies. Classifying over the distinct set is
//! equivalent to classifying over every row — a literal parses the same way
//! however often it repeats — and integer range tracking over distinct values
//! yields the same min/max.

use chrono::{NaiveDate, NaiveDateTime};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{CsvIngestOptions, CsvType, RawRows};

/// Resolved per-column plan handed to the coercion stage.
#[derive(Debug, Clone)]
pub(crate) struct ColumnPlan {
    /// Original (pre-normalization) header name.
    pub name: String,
    pub ty: CsvType,
    /// True when the type came from a user override rather than inference.
    pub forced: bool,
    /// True when at least one value matched the missing-token set.
    pub nullable: bool,
    /// Distinct non-missing stripped values observed.
    pub distinct_non_missing: usize,
}

/// Missing-token matcher shared by inference and coercion.
///
/// Matching is exact on the whitespace-stripped field. The empty string is
/// always missing; a per-column override replaces the global set for that
/// column.
pub(crate) struct MissingTokens {
    global: FxHashSet<String>,
    per_column: FxHashMap<String, FxHashSet<String>>,
}

impl MissingTokens {
    pub(crate) fn from_options(options: &CsvIngestOptions) -> Self {
        let global = options.missing_tokens.iter().cloned().collect();
        let per_column = options
            .per_column_missing_tokens
            .iter()
            .map(|(name, tokens)| (name.clone(), tokens.iter().cloned().collect()))
            .collect();
        Self { global, per_column }
    }

    pub(crate) fn is_missing(&self, column: &str, stripped: &str) -> bool {
        if stripped.is_empty() {
            return true;
        }
        match self.per_column.get(column) {
            Some(set) => set.contains(stripped),
            None => self.global.contains(stripped),
        }
    }
}

pub(crate) fn infer(rows: &RawRows, options: &CsvIngestOptions) -> Vec<ColumnPlan> {
    let tokens = MissingTokens::from_options(options);
    let mut plans = Vec::with_capacity(rows.header.len());

    for (col_idx, name) in rows.header.iter().enumerate() {
        let mut distinct: FxHashSet<&str> = FxHashSet::default();
        let mut missing = 0usize;
        for row in &rows.rows {
            let stripped = row[col_idx].trim();
            if tokens.is_missing(name, stripped) {
                missing += 1;
            } else {
                distinct.insert(stripped);
            }
        }

        let nullable = missing > 0;
        let plan = if let Some(forced) = options.column_type_overrides.get(name) {
            ColumnPlan {
                name: name.clone(),
                ty: *forced,
                forced: true,
                nullable,
                distinct_non_missing: distinct.len(),
            }
        } else {
            let ty = classify(&distinct, options);
            ColumnPlan {
                name: name.clone(),
                ty,
                forced: false,
                nullable,
                distinct_non_missing: distinct.len(),
            }
        };

        tracing::trace!(
            column = plan.name.as_str(),
            ty = %plan.ty,
            forced = plan.forced,
            nullable = plan.nullable,
            distinct = plan.distinct_non_missing,
            "column plan resolved"
        );
        plans.push(plan);
    }

    plans
}

fn classify(distinct: &FxHashSet<&str>, options: &CsvIngestOptions) -> CsvType {
    // A column that is 100% missing gives no basis for stronger inference;
    // it is typed as nullable string by explicit policy.
    if distinct.is_empty() {
        return CsvType::Utf8;
    }

    if distinct.iter().all(|v| parse_bool(v).is_some()) {
        return CsvType::Boolean;
    }

    let mut min = i64::MAX;
    let mut max = i64::MIN;
    let mut all_ints = true;
    for value in distinct {
        match parse_int(value) {
            Some(v) => {
                min = min.min(v);
                max = max.max(v);
            }
            None => {
                all_ints = false;
                break;
            }
        }
    }
    if all_ints {
        return if options.downcast_integers {
            integer_width(min, max)
        } else {
            CsvType::Int64
        };
    }

    let mut all_floats = true;
    let mut fits_narrow = true;
    for value in distinct {
        match parse_float(value) {
            Some(v) => fits_narrow &= fits_f32(v),
            None => {
                all_floats = false;
                break;
            }
        }
    }
    if all_floats {
        return if fits_narrow {
            CsvType::Float32
        } else {
            CsvType::Float64
        };
    }

    if distinct
        .iter()
        .all(|v| parse_timestamp(v, &options.date_pattern).is_some())
    {
        return CsvType::Timestamp;
    }

    CsvType::Utf8
}

/// Smallest signed width whose range covers `[min, max]`.
fn integer_width(min: i64, max: i64) -> CsvType {
    if min >= i8::MIN as i64 && max <= i8::MAX as i64 {
        CsvType::Int8
    } else if min >= i16::MIN as i64 && max <= i16::MAX as i64 {
        CsvType::Int16
    } else if min >= i32::MIN as i64 && max <= i32::MAX as i64 {
        CsvType::Int32
    } else {
        CsvType::Int64
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_int(s: &str) -> Option<i64> {
    s.parse::<i64>().ok()
}

pub(crate) fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok()
}

/// Whether `v` survives an f64 -> f32 -> f64 round-trip.
pub(crate) fn fits_f32(v: f64) -> bool {
    v.is_nan() || (v as f32) as f64 == v
}

/// Parse against the configured pattern, first as a full timestamp, then as
/// a bare date at midnight so date-only patterns work without extra
/// configuration.
pub(crate) fn parse_timestamp(s: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, pattern).ok().or_else(|| {
        NaiveDate::parse_from_str(s, pattern)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader;

    fn infer_str(text: &str, options: &CsvIngestOptions) -> Vec<ColumnPlan> {
        let rows = reader::parse_str(text, &options.read).expect("parse");
        infer(&rows, options)
    }

    #[test]
    fn priority_order_resolves_each_type() {
        let options = CsvIngestOptions {
            date_pattern: "%Y-%m-%d %H:%M:%S".to_string(),
            ..Default::default()
        };
        let plans = infer_str(
            "flag,count,ratio,seen,label\n\
             true,1,1.5,2024-01-01 10:00:00,alpha\n\
             false,2,2.5,2024-01-02 11:30:00,beta\n",
            &options,
        );
        assert_eq!(plans[0].ty, CsvType::Boolean);
        assert_eq!(plans[1].ty, CsvType::Int8);
        assert_eq!(plans[2].ty, CsvType::Float32);
        assert_eq!(plans[3].ty, CsvType::Timestamp);
        assert_eq!(plans[4].ty, CsvType::Utf8);
    }

    #[test]
    fn integers_downcast_to_covering_width() {
        let plans = infer_str(
            "a,b,c,d\n1,200,40000,3000000000\n-5,-200,-40000,-3000000000\n",
            &CsvIngestOptions::default(),
        );
        assert_eq!(plans[0].ty, CsvType::Int8);
        assert_eq!(plans[1].ty, CsvType::Int16);
        assert_eq!(plans[2].ty, CsvType::Int32);
        assert_eq!(plans[3].ty, CsvType::Int64);
    }

    #[test]
    fn downcast_can_be_disabled() {
        let options = CsvIngestOptions {
            downcast_integers: false,
            ..Default::default()
        };
        let plans = infer_str("a\n1\n2\n", &options);
        assert_eq!(plans[0].ty, CsvType::Int64);
    }

    #[test]
    fn one_bad_value_demotes_the_whole_column() {
        let plans = infer_str("a\n1\n2\nabc\n", &CsvIngestOptions::default());
        assert_eq!(plans[0].ty, CsvType::Utf8);
    }

    #[test]
    fn integers_mixed_with_decimals_become_float() {
        let plans = infer_str("amt\n1\n2.5\n", &CsvIngestOptions::default());
        assert_eq!(plans[0].ty, CsvType::Float32);
    }

    #[test]
    fn wide_floats_stay_float64() {
        // 0.1 does not survive an f32 round-trip.
        let plans = infer_str("x\n0.1\n0.2\n", &CsvIngestOptions::default());
        assert_eq!(plans[0].ty, CsvType::Float64);
    }

    #[test]
    fn missing_tokens_are_excluded_from_classification() {
        // Scenario A: "NA" and the empty string are missing, the rest is a
        // float column.
        let options = CsvIngestOptions {
            missing_tokens: vec!["NA".to_string()],
            ..Default::default()
        };
        let plans = infer_str("id,amt\n1,5.0\n2,\n3,NA\n", &options);
        assert_eq!(plans[1].ty, CsvType::Float32);
        assert!(plans[1].nullable);
        assert_eq!(plans[1].distinct_non_missing, 1);
        // id has no missing values.
        assert!(!plans[0].nullable);
    }

    #[test]
    fn all_missing_column_is_nullable_string() {
        let plans = infer_str("a,b\n1,NA\n2,\n", &CsvIngestOptions::default());
        assert_eq!(plans[1].ty, CsvType::Utf8);
        assert!(plans[1].nullable);
        assert_eq!(plans[1].distinct_non_missing, 0);
    }

    #[test]
    fn per_column_override_replaces_global_tokens() {
        let mut per_column = FxHashMap::default();
        per_column.insert("b".to_string(), vec!["-".to_string()]);
        let options = CsvIngestOptions {
            per_column_missing_tokens: per_column,
            ..Default::default()
        };
        // "NA" is missing globally but a literal value for column b.
        let plans = infer_str("a,b\nNA,-\n1,NA\n", &options);
        assert!(plans[0].nullable);
        assert_eq!(plans[0].ty, CsvType::Int8);
        assert!(plans[1].nullable);
        assert_eq!(plans[1].ty, CsvType::Utf8);
    }

    #[test]
    fn forced_type_is_carried_without_validation() {
        let mut overrides = FxHashMap::default();
        overrides.insert("a".to_string(), CsvType::Int32);
        let options = CsvIngestOptions {
            column_type_overrides: overrides,
            ..Default::default()
        };
        let plans = infer_str("a\nabc\n", &options);
        assert_eq!(plans[0].ty, CsvType::Int32);
        assert!(plans[0].forced);
    }

    #[test]
    fn timestamps_with_configured_pattern() {
        // The default pattern matches the civic-export style.
        let plans = infer_str(
            "created\n07/06/2015 12:57:24 PM\n07/06/2015 01:00:00 AM\n",
            &CsvIngestOptions::default(),
        );
        assert_eq!(plans[0].ty, CsvType::Timestamp);
    }

    #[test]
    fn date_only_pattern_parses_at_midnight() {
        let ts = parse_timestamp("2024-03-01", "%Y-%m-%d").expect("parse date");
        assert_eq!(ts.format("%H:%M:%S").to_string(), "00:00:00");
    }
}
