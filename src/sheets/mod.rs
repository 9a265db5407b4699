//! Google Sheets backed score store and subject catalog.
//!
//! The first worksheet holds the subject catalog in its first column. The
//! second worksheet is the score log: a header row naming the columns, then
//! one row per recorded score.

pub mod client;
pub mod token;

pub use client::SheetsClient;

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::model::ScoreRecord;

/// Columns the score log header must contain.
pub const REQUIRED_COLUMNS: [&str; 5] = ["semester", "subject", "test_type", "score", "weight"];

/// Body of a `values.get` response. `values` is omitted when the range is
/// empty.
#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Extracts the subject catalog from the rows of a single-column range:
/// first cell of each row, trimmed, blanks dropped.
pub fn parse_subjects(values: &[Vec<Value>]) -> Vec<String> {
    values
        .iter()
        .filter_map(|row| row.first())
        .map(|cell| cell_text(cell).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Converts the rows of the score log into records.
///
/// The first row is the header. With no data rows the result is empty and
/// the header is not checked. Rows whose cells are all blank are skipped.
/// Score and weight must be numbers or numeric text.
pub fn parse_score_log(values: &[Vec<Value>]) -> Result<Vec<ScoreRecord>, AppError> {
    let Some((header, rows)) = values.split_first() else {
        return Ok(Vec::new());
    };

    let rows: Vec<(usize, &Vec<Value>)> = rows
        .iter()
        .enumerate()
        // sheet rows are 1-based and the header takes row 1
        .map(|(i, row)| (i + 2, row))
        .filter(|(_, row)| !row.iter().all(is_blank))
        .collect();

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns: Vec<String> = header.iter().map(|c| cell_text(c).trim().to_string()).collect();
    let position = |name: &str| columns.iter().position(|c| c == name);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&name| position(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MissingColumns { missing });
    }

    let [semester, subject, test_type, score, weight] =
        REQUIRED_COLUMNS.map(|name| position(name).unwrap_or_default());

    rows.into_iter()
        .map(|(line, row)| -> Result<ScoreRecord, AppError> {
            let text = |col: usize| row.get(col).map(cell_text).unwrap_or_default();
            Ok(ScoreRecord {
                semester: text(semester),
                subject: text(subject),
                test_type: text(test_type),
                score: cell_number(row.get(score), "score", line)?,
                weight: cell_number(row.get(weight), "weight", line)?,
            })
        })
        .collect()
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Renders a cell as text the way the sheet would display it.
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_number(cell: Option<&Value>, column: &str, row: usize) -> Result<f64, AppError> {
    let malformed = |message: String| AppError::MalformedRow { row, message };

    let (value, shown) = match cell {
        Some(Value::Number(n)) => (n.as_f64(), n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            (s.trim().parse::<f64>().ok(), s.trim().to_string())
        }
        Some(Value::Bool(_)) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
            return Err(malformed(format!("{column} is not a number")));
        }
        _ => return Err(malformed(format!("{column} is empty"))),
    };

    // "nan", "inf" and overflowing text parse as f64 but are not scores
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed(format!("{column} '{shown}' is not a number")))
}
