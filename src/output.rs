//! Rendering of session outcomes.
//!
//! [`render`] is the single place an [`Outcome`] becomes user-facing text.
//! Averages can also be exported to a CSV file.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::averages::AverageRow;
use crate::command::HELP;
use crate::session::{Outcome, SessionState};

/// How a table of averages is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub const NO_DATA_MESSAGE: &str = "No scores recorded yet.";

pub fn render(outcome: &Outcome, format: OutputFormat) -> String {
    match outcome {
        Outcome::Selection(state) => render_selection(state),
        Outcome::Subjects(subjects) => render_subjects(subjects),
        Outcome::Recorded(entry) => format!(
            "Recorded {} score {} for {} ({}, weight {}).",
            entry.test_type, entry.score, entry.subject, entry.semester, entry.weight
        ),
        Outcome::Averages(rows) => {
            let rendered = match format {
                OutputFormat::Table => Ok(averages_table(rows)),
                OutputFormat::Json => averages_json(rows),
                OutputFormat::Csv => averages_csv(rows),
            };
            rendered.unwrap_or_else(|e| format!("error: cannot format averages: {e:#}"))
        }
        Outcome::NoData => NO_DATA_MESSAGE.to_string(),
        Outcome::Help => HELP.to_string(),
        Outcome::Failed(e) => format!("error: {e}"),
        Outcome::Quit => "Bye.".to_string(),
    }
}

fn render_selection(state: &SessionState) -> String {
    let subject = if state.subject.is_empty() {
        "(none)"
    } else {
        state.subject.as_str()
    };

    format!(
        "subject:   {}\ntest type: {} (weight {})\nsemester:  {}\nscore:     {}",
        subject,
        state.test_type,
        state.test_type.weight(),
        state.semester,
        state.score
    )
}

fn render_subjects(subjects: &[String]) -> String {
    if subjects.is_empty() {
        return "The subject catalog is empty.".to_string();
    }

    subjects
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{:>3}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}

const CSV_HEADER: [&str; 3] = ["semester", "subject", "average"];

/// Table and CSV averages carry two decimals.
fn format_average(average: f64) -> String {
    format!("{average:.2}")
}

/// Formats averages as an aligned text table.
pub fn averages_table(rows: &[AverageRow]) -> String {
    const HEADERS: [&str; 3] = ["Semester", "Subject", "Average"];

    let averages: Vec<String> = rows.iter().map(|r| format_average(r.average)).collect();

    let w_semester = rows
        .iter()
        .map(|r| r.semester.chars().count())
        .fold(HEADERS[0].len(), usize::max);
    let w_subject = rows
        .iter()
        .map(|r| r.subject.chars().count())
        .fold(HEADERS[1].len(), usize::max);
    let w_average = averages.iter().map(String::len).fold(HEADERS[2].len(), usize::max);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "{:<w_semester$} | {:<w_subject$} | {:>w_average$}",
        HEADERS[0], HEADERS[1], HEADERS[2]
    ));
    lines.push(format!(
        "{}-+-{}-+-{}",
        "-".repeat(w_semester),
        "-".repeat(w_subject),
        "-".repeat(w_average)
    ));
    for (row, average) in rows.iter().zip(&averages) {
        lines.push(format!(
            "{:<w_semester$} | {:<w_subject$} | {:>w_average$}",
            row.semester, row.subject, average
        ));
    }
    lines.join("\n")
}

/// Formats averages as pretty-printed JSON.
///
/// `average` stays a number, so `7.0` is emitted as `7.0` rather than the
/// two-decimal text the table and CSV use.
pub fn averages_json(rows: &[AverageRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    semester: &'a str,
    subject: &'a str,
    average: String,
}

impl<'a> From<&'a AverageRow> for CsvRow<'a> {
    fn from(row: &'a AverageRow) -> Self {
        Self {
            semester: &row.semester,
            subject: &row.subject,
            average: format_average(row.average),
        }
    }
}

/// Writes the header and then one record per row. The header is written
/// explicitly so an empty set still produces it.
fn write_averages<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    rows: &[AverageRow],
) -> Result<()> {
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(CsvRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Formats averages as CSV with a header row.
pub fn averages_csv(rows: &[AverageRow]) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    write_averages(&mut writer, rows)?;
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Writes averages to a CSV file at `path`, replacing any existing file.
/// With no rows the file holds only the header.
pub fn export_csv(path: &Path, rows: &[AverageRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Exporting averages");

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    write_averages(&mut writer, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::model::{Score, ScoreEntry, Semester, TestType};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn rows() -> Vec<AverageRow> {
        vec![
            AverageRow {
                semester: "Term I".into(),
                subject: "Math".into(),
                average: 8.33,
            },
            AverageRow {
                semester: "Term II".into(),
                subject: "Literature".into(),
                average: 7.0,
            },
        ]
    }

    #[test]
    fn test_table_alignment() {
        let table = averages_table(&rows());
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Semester | Subject    | Average");
        assert_eq!(lines[1], "---------+------------+--------");
        assert_eq!(lines[2], "Term I   | Math       |    8.33");
        assert_eq!(lines[3], "Term II  | Literature |    7.00");
    }

    #[test]
    fn test_no_data_is_distinct_from_failure() {
        let no_data = render(&Outcome::NoData, OutputFormat::Table);
        let failed = render(
            &Outcome::Failed(AppError::Connection("timed out".into())),
            OutputFormat::Table,
        );

        assert_eq!(no_data, NO_DATA_MESSAGE);
        assert_eq!(failed, "error: could not reach the spreadsheet: timed out");
    }

    #[test]
    fn test_render_recorded() {
        let entry = ScoreEntry::new(
            Semester::TermI,
            "Math",
            TestType::Final,
            Score::new(9.0).unwrap(),
        );
        assert_eq!(
            render(&Outcome::Recorded(entry), OutputFormat::Table),
            "Recorded Final score 9 for Math (Term I, weight 2)."
        );
    }

    #[test]
    fn test_render_selection_without_subject() {
        let state = SessionState::new(&[]);
        let text = render(&Outcome::Selection(state), OutputFormat::Table);

        assert!(text.starts_with("subject:   (none)"));
        assert!(text.contains("test type: Regular (weight 1)"));
    }

    #[test]
    fn test_json_and_csv_formats() {
        let json = render(&Outcome::Averages(rows()), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["average"], 8.33);
        assert_eq!(parsed[1]["subject"], "Literature");

        let csv = render(&Outcome::Averages(rows()), OutputFormat::Csv);
        assert_eq!(csv, "semester,subject,average\nTerm I,Math,8.33\nTerm II,Literature,7.00\n");
    }

    #[test]
    fn test_export_csv_writes_header_once() {
        let path = temp_path("grade_tracker_test_export.csv");
        let _ = fs::remove_file(&path);

        export_csv(&path, &rows()).unwrap();
        export_csv(&path, &rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "semester,subject,average");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_csv_keeps_two_decimals_like_the_table() {
        let rows = vec![AverageRow {
            semester: "Term I".into(),
            subject: "Chemistry".into(),
            average: 9.5,
        }];

        let csv = averages_csv(&rows).unwrap();
        assert_eq!(csv.lines().nth(1), Some("Term I,Chemistry,9.50"));
        assert!(averages_table(&rows).ends_with("9.50"));

        let json: serde_json::Value = serde_json::from_str(&averages_json(&rows).unwrap()).unwrap();
        assert_eq!(json[0]["average"], 9.5);
    }

    #[test]
    fn test_export_csv_without_rows_writes_header_only() {
        let path = temp_path("grade_tracker_test_export_empty.csv");
        let _ = fs::remove_file(&path);

        export_csv(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "semester,subject,average\n");
        assert_eq!(averages_csv(&[]).unwrap(), "semester,subject,average\n");

        fs::remove_file(&path).unwrap();
    }
}
