//! Data types produced by the aggregation.

use serde::Serialize;

/// Weighted average for one (semester, subject) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageRow {
    pub semester: String,
    pub subject: String,
    pub average: f64,
}
