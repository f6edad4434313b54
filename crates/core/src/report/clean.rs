use std::collections::HashSet;

use crate::report::performance_row::PerformanceRow;

/// Drops every row whose average performance exactly equals an earlier row's.
///
/// Faces that were split into several identities share the same video set
/// and therefore the same average; this collapses them to the first one.
pub fn dedupe_by_average_performance(rows: Vec<PerformanceRow>) -> Vec<PerformanceRow> {
    let original = rows.len();
    let mut seen = HashSet::new();
    let cleaned: Vec<PerformanceRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.average_performance.to_bits()))
        .collect();
    log::info!("Original rows: {original}, cleaned rows: {}", cleaned.len());
    cleaned
}
