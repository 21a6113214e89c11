//! Loading experiment results from delimited text files.
//!
//! Column types are inferred from the data: a column is integer if every
//! cell parses as an integer, float if every non-empty cell parses as a
//! number, and text otherwise.

use crate::models::{Table, TableError, Value};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns every results file must provide.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "category",
    "adv_RT",
    "sentence_RT",
    "word_length",
    "id",
    "adv",
    "surprisal",
];

/// Errors that can occur while loading a results file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("results file is empty")]
    EmptyInput,

    #[error("parse error at row {row}: {reason}")]
    Parse { row: u64, reason: String },

    #[error("invalid delimiter '{0}': must be a single ASCII character or 'tab'")]
    Delimiter(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Parse a delimiter setting into a byte.
///
/// Accepts a literal single ASCII character, the escape `\t`, or `tab`.
pub fn parse_delimiter(setting: &str) -> Result<u8, LoadError> {
    match setting {
        "\\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        other => Err(LoadError::Delimiter(other.to_string())),
    }
}

/// Load a results file from disk.
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_table(file, delimiter)?;
    info!(
        "Loaded {} trials with {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Read a table with a header row from any reader.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<Table, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        // Width mismatches are reported below with our own row numbers.
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = csv_reader
        .headers()
        .map_err(|e| map_csv_error(e, 1))?
        .iter()
        .map(String::from)
        .collect();

    if header.is_empty() || header.iter().all(String::is_empty) {
        return Err(LoadError::EmptyInput);
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        // Header is row 1.
        let row_number = i as u64 + 2;
        let record = record.map_err(|e| map_csv_error(e, row_number))?;

        if record.len() != header.len() {
            return Err(LoadError::Parse {
                row: row_number,
                reason: format!(
                    "expected {} fields, found {}",
                    header.len(),
                    record.len()
                ),
            });
        }
        raw_rows.push(record.iter().map(String::from).collect());
    }

    let kinds: Vec<ColumnKind> = (0..header.len())
        .map(|col| infer_kind(raw_rows.iter().map(|row| row[col].as_str())))
        .collect();

    for (name, kind) in header.iter().zip(&kinds) {
        debug!("Column '{}' inferred as {:?}", name, kind);
    }

    let mut table = Table::new(header.iter().cloned());
    for raw in raw_rows {
        let row = raw
            .into_iter()
            .zip(&kinds)
            .map(|(cell, kind)| convert_cell(cell, *kind))
            .collect();
        table.push_row(row)?;
    }

    Ok(table)
}

/// Check that every required column is present.
pub fn validate_schema(table: &Table, required: &[&str]) -> Result<(), TableError> {
    for column in required {
        table.column_index(column)?;
    }

    let extra: Vec<&String> = table
        .columns()
        .iter()
        .filter(|c| !required.contains(&c.as_str()))
        .collect();
    if !extra.is_empty() {
        debug!("Ignoring extra columns: {:?}", extra);
    }

    Ok(())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnKind {
    let mut non_empty = cells.clone().filter(|c| !c.is_empty()).peekable();
    if non_empty.peek().is_none() {
        return ColumnKind::Text;
    }

    let has_empty = cells.clone().any(str::is_empty);
    if !has_empty && cells.clone().all(|c| c.parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if non_empty.all(|c| c.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    }
}

fn convert_cell(cell: String, kind: ColumnKind) -> Value {
    match kind {
        ColumnKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Text(cell)),
        ColumnKind::Float if cell.is_empty() => {
            warn!("Missing numeric value; treating as NaN");
            Value::Float(f64::NAN)
        }
        ColumnKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Text(cell)),
        ColumnKind::Text => Value::Text(cell),
    }
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> LoadError {
    let row = err
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback_row);
    match err.into_kind() {
        csv::ErrorKind::Io(e) => LoadError::Parse {
            row,
            reason: e.to_string(),
        },
        csv::ErrorKind::Utf8 { err, .. } => LoadError::Parse {
            row,
            reason: format!("invalid UTF-8: {}", err),
        },
        other => LoadError::Parse {
            row,
            reason: format!("{:?}", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "id\tcategory\tadv\tword_length\tsurprisal\tadv_RT\tsentence_RT\n\
                          1\tcommon\toften\t5\t12.5\t0.8\t4.1\n\
                          1\trare\toft\t3\t40.25\t1.2\t5.0\n\
                          2\tcommon\toften\t5\t12.5\t0.6\t3.9\n";

    #[test]
    fn test_read_table_infers_types() {
        let table = read_table(SAMPLE.as_bytes(), b'\t').unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns().len(), 7);
        assert!(matches!(table.column("id").unwrap()[0], Value::Int(1)));
        assert_eq!(table.column("category").unwrap()[0], &Value::from("common"));
        assert!(matches!(table.column("surprisal").unwrap()[1], Value::Float(x) if *x == 40.25));
        assert_eq!(table.numeric_column("adv_RT").unwrap(), vec![0.8, 1.2, 0.6]);
        assert!(validate_schema(&table, REQUIRED_COLUMNS).is_ok());
    }

    #[test]
    fn test_mixed_int_and_float_column_is_float() {
        let data = "x\ty\n1\t2\n2.5\t3\n";
        let table = read_table(data.as_bytes(), b'\t').unwrap();
        assert!(matches!(table.column("x").unwrap()[0], Value::Float(x) if *x == 1.0));
        assert!(matches!(table.column("y").unwrap()[0], Value::Int(2)));
    }

    #[test]
    fn test_empty_numeric_cell_is_nan() {
        let data = "adv_RT\tadv\n1.5\ta\n\tb\n";
        let table = read_table(data.as_bytes(), b'\t').unwrap();
        let values = table.numeric_column("adv_RT").unwrap();
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_ragged_row_reports_row_number() {
        let data = "a\tb\n1\t2\n3\n";
        let err = read_table(data.as_bytes(), b'\t').unwrap_err();
        assert!(matches!(err, LoadError::Parse { row: 3, .. }));
    }

    #[test]
    fn test_empty_input() {
        let err = read_table("".as_bytes(), b'\t').unwrap_err();
        assert!(matches!(err, LoadError::EmptyInput));
    }

    #[test]
    fn test_validate_schema_missing_column() {
        let data = "id\tadv_RT\n1\t0.5\n";
        let table = read_table(data.as_bytes(), b'\t').unwrap();
        let err = validate_schema(&table, REQUIRED_COLUMNS).unwrap_err();
        assert_eq!(
            err,
            TableError::MissingColumn {
                column: "category".to_string()
            }
        );
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn test_load_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.replace('\t', ",").as_bytes()).unwrap();

        let table = load_table(file.path(), b',').unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_load_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/dataMM.txt");
        let table = load_table(&path, b'\t').unwrap();

        assert!(validate_schema(&table, REQUIRED_COLUMNS).is_ok());
        assert_eq!(table.len(), 24);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_table(Path::new("/nonexistent/results.txt"), b'\t').unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
