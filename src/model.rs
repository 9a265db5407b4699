//! Domain types for recorded scores.
//!
//! [`ScoreEntry`] is what the user submits; its weight is always derived
//! from the [`TestType`]. [`ScoreRecord`] is what comes back from the score
//! log, with the weight that was recorded at the time.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Kind of assessment a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TestType {
    #[default]
    Regular,
    Midterm,
    Final,
    TermExam,
}

impl TestType {
    pub const ALL: [TestType; 4] = [
        TestType::Regular,
        TestType::Midterm,
        TestType::Final,
        TestType::TermExam,
    ];

    /// Weight a score of this type carries in the weighted average.
    ///
    /// | Type      | Weight |
    /// |-----------|--------|
    /// | Regular   | 1      |
    /// | Midterm   | 1      |
    /// | Final     | 2      |
    /// | Term Exam | 3      |
    pub fn weight(self) -> u32 {
        match self {
            TestType::Regular => 1,
            TestType::Midterm => 1,
            TestType::Final => 2,
            TestType::TermExam => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestType::Regular => "Regular",
            TestType::Midterm => "Midterm",
            TestType::Final => "Final",
            TestType::TermExam => "Term Exam",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        TestType::ALL
            .into_iter()
            .find(|t| normalize(t.label()) == key)
            .ok_or_else(|| {
                AppError::Input(format!(
                    "unknown test type '{}' (expected one of: {})",
                    s.trim(),
                    labels(&TestType::ALL)
                ))
            })
    }
}

/// Term a score is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Semester {
    #[default]
    TermI,
    TermII,
}

impl Semester {
    pub const ALL: [Semester; 2] = [Semester::TermI, Semester::TermII];

    pub fn label(self) -> &'static str {
        match self {
            Semester::TermI => "Term I",
            Semester::TermII => "Term II",
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Semester {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "termi" | "i" | "1" | "term1" => Ok(Semester::TermI),
            "termii" | "ii" | "2" | "term2" => Ok(Semester::TermII),
            _ => Err(AppError::Input(format!(
                "unknown semester '{}' (expected one of: {})",
                s.trim(),
                labels(&Semester::ALL)
            ))),
        }
    }
}

/// Lowercases and drops spaces, dashes and underscores so that
/// `"Term Exam"`, `"term-exam"` and `"TERM_EXAM"` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn labels<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A score on the 0 to 10 scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 10.0;

    pub fn new(value: f64) -> Result<Self, AppError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(AppError::Input(format!(
                "score {value} is outside {}..={}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Score {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| AppError::Input(format!("score '{}' is not a number", s.trim())))?;
        Score::new(value)
    }
}

/// A score about to be appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub semester: Semester,
    pub subject: String,
    pub test_type: TestType,
    pub score: Score,
    pub weight: u32,
}

impl ScoreEntry {
    pub fn new(semester: Semester, subject: &str, test_type: TestType, score: Score) -> Self {
        Self {
            semester,
            subject: subject.to_string(),
            test_type,
            score,
            weight: test_type.weight(),
        }
    }

    /// Cell values in score log column order:
    /// semester, subject, test_type, score, weight.
    pub fn to_row(&self) -> Vec<serde_json::Value> {
        vec![
            self.semester.label().into(),
            self.subject.clone().into(),
            self.test_type.label().into(),
            self.score.value().into(),
            self.weight.into(),
        ]
    }
}

impl Serialize for TestType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl Serialize for Semester {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A row read back from the score log.
///
/// Labels stay as the strings found in the sheet; grouping compares them
/// exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub semester: String,
    pub subject: String,
    pub test_type: String,
    pub score: f64,
    pub weight: f64,
}

impl ScoreRecord {
    pub fn new(semester: &str, subject: &str, test_type: &str, score: f64, weight: f64) -> Self {
        Self {
            semester: semester.to_string(),
            subject: subject.to_string(),
            test_type: test_type.to_string(),
            score,
            weight,
        }
    }
}

impl From<&ScoreEntry> for ScoreRecord {
    fn from(entry: &ScoreEntry) -> Self {
        ScoreRecord::new(
            entry.semester.label(),
            &entry.subject,
            entry.test_type.label(),
            entry.score.value(),
            entry.weight as f64,
        )
    }
}
