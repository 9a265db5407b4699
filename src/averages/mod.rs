//! Weighted score averages.
//!
//! This module groups recorded scores by (semester, subject) and reduces
//! each group to a weighted mean rounded to two decimal places.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{weighted_average, weighted_averages};
pub use types::AverageRow;
