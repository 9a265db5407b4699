use crate::averages::types::AverageRow;
use crate::averages::utility::round_to;
use crate::model::ScoreRecord;
use std::collections::HashMap;

/// Decimal places kept in every average.
const PLACES: i32 = 2;

/// Weighted mean of a group given its running totals.
///
/// Returns 0.0 when `weight_total` is not positive. Every test type weighs
/// at least 1 today, but a zero-weight category must not divide by zero.
pub fn weighted_average(weighted_sum: f64, weight_total: f64) -> f64 {
    if weight_total > 0.0 {
        round_to(weighted_sum / weight_total, PLACES)
    } else {
        0.0
    }
}

/// Reduces score records into one [`AverageRow`] per distinct
/// (semester, subject) pair.
///
/// Rows come out grouped by semester in order of first appearance, and
/// within a semester by subject in order of first appearance.
pub fn weighted_averages(records: &[ScoreRecord]) -> Vec<AverageRow> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut semester_rank: HashMap<&str, usize> = HashMap::new();
    let mut totals: HashMap<(&str, &str), (f64, f64)> = HashMap::new();

    for record in records {
        let key = (record.semester.as_str(), record.subject.as_str());

        let next_rank = semester_rank.len();
        semester_rank.entry(key.0).or_insert(next_rank);

        let (weighted_sum, weight_total) = totals.entry(key).or_insert_with(|| {
            order.push(key);
            (0.0, 0.0)
        });
        *weighted_sum += record.score * record.weight;
        *weight_total += record.weight;
    }

    // stable: keeps subject first-appearance order inside each semester
    order.sort_by_key(|(semester, _)| semester_rank[semester]);

    order
        .into_iter()
        .map(|key| {
            let (weighted_sum, weight_total) = totals[&key];
            AverageRow {
                semester: key.0.to_string(),
                subject: key.1.to_string(),
                average: weighted_average(weighted_sum, weight_total),
            }
        })
        .collect()
}
