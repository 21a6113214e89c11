//! Data models for the reading-time analyzer.
//!
//! This module contains the core data structures used throughout
//! the application for representing trial tables, group statistics,
//! and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors raised when a table does not have the shape the caller expects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("column '{column}' not found in table")]
    MissingColumn { column: String },

    #[error("column '{column}' is not numeric (row {row}: '{value}')")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A single cell value, also used as a group key.
///
/// Numeric values compare numerically regardless of representation, so
/// `Value::Int(5) == Value::Float(5.0)`. All numbers order before text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Returns the numeric value, or `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    /// Returns the integer value if this is an integer cell.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), _) => Ordering::Greater,
            (_, Value::Text(_)) => Ordering::Less,
            (Value::Float(a), Value::Float(b)) => float_cmp(*a, *b),
            (Value::Int(a), Value::Float(b)) => int_float_cmp(*a, *b),
            (Value::Float(a), Value::Int(b)) => int_float_cmp(*b, *a).reverse(),
        }
    }
}

/// Numeric order with `-0.0 == 0.0`; NaNs sort by `total_cmp`.
fn float_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Exact comparison of an integer with a float, without rounding the integer.
fn int_float_cmp(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return float_cmp(0.0, f);
    }
    match (i as f64).partial_cmp(&f) {
        Some(Ordering::Equal) | None => {
            // `f` is integral here; 2^63 itself is out of i64 range.
            if f >= 9_223_372_036_854_775_808.0 {
                Ordering::Less
            } else {
                i.cmp(&(f as i64))
            }
        }
        Some(order) => order,
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            numeric => {
                0u8.hash(state);
                // Equal numbers hash alike, including `Int(0)`, `0.0` and `-0.0`.
                let x = numeric.as_f64().unwrap_or(0.0);
                let x = if x == 0.0 { 0.0 } else { x };
                x.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// An ordered table of trial records with a named schema.
///
/// Tables are never mutated by the analysis layer; filtering produces a copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates a table from rows, checking every row matches the schema width.
    #[cfg(test)]
    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the schema.
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// All values of a column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// All values of a numeric column as `f64`, in row order.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, values)| {
                values[idx]
                    .as_f64()
                    .ok_or_else(|| TableError::NotNumeric {
                        column: name.to_string(),
                        row,
                        value: values[idx].to_string(),
                    })
            })
            .collect()
    }

    /// Copies the rows matching `predicate`, preserving order and schema.
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }
}

/// One of the four statistics computed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    AdvRtMean,
    AdvRtMedian,
    SentRtMean,
    SentRtMedian,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AdvRtMean,
        Metric::AdvRtMedian,
        Metric::SentRtMean,
        Metric::SentRtMedian,
    ];

    /// Column name of this statistic in a summary table.
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::AdvRtMean => "adv_RT_mean",
            Metric::AdvRtMedian => "adv_RT_median",
            Metric::SentRtMean => "sent_RT_mean",
            Metric::SentRtMedian => "sent_RT_median",
        }
    }
}

/// Mean and median reading times for one group.
///
/// An empty group has `count == 0` and every statistic set to `NaN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Value of the grouping column.
    pub key: Value,
    /// Number of trials in the group.
    pub count: usize,
    pub adv_rt_mean: f64,
    pub adv_rt_median: f64,
    pub sent_rt_mean: f64,
    pub sent_rt_median: f64,
}

impl SummaryRow {
    /// Row describing a group with no trials.
    pub fn empty(key: Value) -> Self {
        Self {
            key,
            count: 0,
            adv_rt_mean: f64::NAN,
            adv_rt_median: f64::NAN,
            sent_rt_mean: f64::NAN,
            sent_rt_median: f64::NAN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AdvRtMean => self.adv_rt_mean,
            Metric::AdvRtMedian => self.adv_rt_median,
            Metric::SentRtMean => self.sent_rt_mean,
            Metric::SentRtMedian => self.sent_rt_median,
        }
    }
}

/// One summary row per distinct value of a grouping column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Name of the grouping column.
    pub column: String,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Column headers: the grouping column followed by the four statistics.
    pub fn header(&self) -> Vec<&str> {
        let mut header = vec![self.column.as_str()];
        header.extend(Metric::ALL.iter().map(|m| m.column_name()));
        header
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.rows.iter().map(|r| r.key.clone()).collect()
    }

    /// Statistic values in row order.
    pub fn metric_values(&self, metric: Metric) -> Vec<f64> {
        self.rows.iter().map(|r| r.metric(metric)).collect()
    }

    /// Sparse mapping from group key to a statistic, for use with `assemble`.
    pub fn metric_map(&self, metric: Metric) -> HashMap<Value, f64> {
        self.rows
            .iter()
            .map(|r| (r.key.clone(), r.metric(metric)))
            .collect()
    }
}

/// A (common, rare) adverb pair, used to order per-adverb plots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdverbPair(pub String, pub String);

impl AdverbPair {
    pub fn common(&self) -> &str {
        &self.0
    }

    pub fn rare(&self) -> &str {
        &self.1
    }
}

/// Experimental condition a trial belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Common,
    Rare,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Common => write!(f, "Common"),
            Condition::Rare => write!(f, "Rare"),
        }
    }
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Common, Condition::Rare];

    /// Selects this condition's adverb from a pair.
    pub fn adverb<'a>(&self, pair: &'a AdverbPair) -> &'a str {
        match self {
            Condition::Common => pair.common(),
            Condition::Rare => pair.rare(),
        }
    }
}

/// Overall statistics for one condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub condition: Condition,
    /// Statistics over every trial of the condition.
    pub overall: SummaryRow,
    /// Mean of the per-adverb mean adverb RTs.
    pub adverb_rt_grand_mean: f64,
    /// Mean of the per-adverb mean sentence RTs.
    pub sentence_rt_grand_mean: f64,
}

/// Per-group statistics of one condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedStats {
    pub condition: Condition,
    pub summary: SummaryTable,
}

/// Metadata about the analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the results file that was analyzed.
    pub data_path: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Number of trials in the results file.
    pub trials: usize,
    /// Number of distinct participants.
    pub participants: usize,
    /// Number of distinct adverbs.
    pub adverbs: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub conditions: Vec<ConditionSummary>,
    pub by_word_length: Vec<GroupedStats>,
    pub by_participant: Vec<GroupedStats>,
    pub by_adverb: Vec<GroupedStats>,
    /// File names of the rendered figures.
    pub figures: Vec<String>,
}
