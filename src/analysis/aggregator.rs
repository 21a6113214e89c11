//! Reading-time aggregation and statistics.
//!
//! This module groups trial records by a categorical column, computes
//! mean and median reading times per group, and reassembles sparse
//! per-group statistics onto a dense axis for plotting.

use crate::models::{SummaryRow, SummaryTable, Table, TableError, Value};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Column holding the adverb reading time.
pub const ADV_RT: &str = "adv_RT";

/// Column holding the whole-sentence reading time.
pub const SENTENCE_RT: &str = "sentence_RT";

/// Arithmetic mean, `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, averaging the two middle values of an even-length sample.
///
/// A sample containing `NaN` has a `NaN` median.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    if values.iter().any(|v| v.is_nan()) {
        return Some(f64::NAN);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation (divides by `n`).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Rows whose `column` equals `value`, in original order.
///
/// Matching zero rows is not an error; the result is an empty table with
/// the same schema.
pub fn subset(table: &Table, column: &str, value: &Value) -> Result<Table, TableError> {
    let idx = table.column_index(column)?;
    Ok(table.filter(|row| row[idx] == *value))
}

/// Distinct values of a column, sorted ascending.
pub fn distinct_values(table: &Table, column: &str) -> Result<Vec<Value>, TableError> {
    let values: BTreeSet<Value> = table.column(column)?.into_iter().cloned().collect();
    Ok(values.into_iter().collect())
}

/// Mean and median adverb/sentence RTs over the rows where `column == value`.
///
/// An empty group yields `SummaryRow::empty`, whose statistics are `NaN`.
pub fn group_summary(
    table: &Table,
    column: &str,
    value: &Value,
) -> Result<SummaryRow, TableError> {
    let rows = subset(table, column, value)?;
    let adv = rows.numeric_column(ADV_RT)?;
    let sent = rows.numeric_column(SENTENCE_RT)?;

    if rows.is_empty() {
        return Ok(SummaryRow::empty(value.clone()));
    }

    Ok(SummaryRow {
        key: value.clone(),
        count: rows.len(),
        adv_rt_mean: mean(&adv).unwrap_or(f64::NAN),
        adv_rt_median: median(&adv).unwrap_or(f64::NAN),
        sent_rt_mean: mean(&sent).unwrap_or(f64::NAN),
        sent_rt_median: median(&sent).unwrap_or(f64::NAN),
    })
}

/// One summary row per distinct value of `column`, sorted by that value.
pub fn aggregate_by_category(table: &Table, column: &str) -> Result<SummaryTable, TableError> {
    let rows = distinct_values(table, column)?
        .iter()
        .map(|value| group_summary(table, column, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SummaryTable {
        column: column.to_string(),
        rows,
    })
}

/// Look up each index in `value_map`, substituting `default` when absent.
///
/// The output always has the same length and order as `indices`.
pub fn assemble<K, V>(indices: &[K], value_map: &HashMap<K, V>, default: V) -> Vec<V>
where
    K: Eq + Hash,
    V: Clone,
{
    indices
        .iter()
        .map(|idx| value_map.get(idx).cloned().unwrap_or_else(|| default.clone()))
        .collect()
}

/// Every integer from the smallest to the largest key, if all keys are integers.
pub fn integer_axis(keys: &[Value]) -> Option<Vec<i64>> {
    let ints: Vec<i64> = keys.iter().map(Value::as_i64).collect::<Option<_>>()?;
    let min = *ints.iter().min()?;
    let max = *ints.iter().max()?;
    Some((min..=max).collect())
}

/// Reorder summary rows so keys listed in `order` come first, in that order.
///
/// Rows whose key is not listed keep their existing relative order after
/// the listed ones. Listed keys with no row are ignored.
pub fn reorder(summary: SummaryTable, order: &[Value]) -> SummaryTable {
    let position = |key: &Value| order.iter().position(|o| o == key).unwrap_or(order.len());

    let mut rows = summary.rows;
    rows.sort_by_key(|row| position(&row.key));

    SummaryTable {
        column: summary.column,
        rows,
    }
}
