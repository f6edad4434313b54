use std::collections::HashSet;

use crate::report::performance_row::PerformanceRow;

/// Keeps the first row for each face image.
pub fn unique_by_face_image(rows: Vec<PerformanceRow>) -> Vec<PerformanceRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.face_image.clone()))
        .collect()
}

/// Best performers first, NaN last. Equal values keep their input order.
pub fn sort_descending(rows: &mut [PerformanceRow]) {
    rows.sort_by(|a, b| {
        let (a, b) = (a.average_performance, b.average_performance);
        a.is_nan().cmp(&b.is_nan()).then_with(|| b.total_cmp(&a))
    });
}

/// File name part of a face image path, for labels.
pub fn short_name(face_image: &str) -> &str {
    face_image
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(face_image)
}

/// Summary statistics over a ranked results table.
///
/// Rows without a finite average count towards `total` only.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub total: usize,
    pub mean: f64,
    pub median: f64,
    pub top: PerformanceRow,
    pub bottom: PerformanceRow,
    /// The best `top_n` rows with a finite average, best first.
    pub top_rows: Vec<PerformanceRow>,
    /// Every finite average performance, best first.
    pub values: Vec<f64>,
}

impl Insights {
    /// `rows` need not be sorted or unique. Returns `None` when no row has a
    /// finite average.
    pub fn compute(rows: &[PerformanceRow], top_n: usize) -> Option<Self> {
        let mut ranked = unique_by_face_image(rows.to_vec());
        sort_descending(&mut ranked);
        let total = ranked.len();
        ranked.retain(|r| r.average_performance.is_finite());

        let top = ranked.first()?.clone();
        let bottom = ranked.last()?.clone();
        let values: Vec<f64> = ranked.iter().map(|r| r.average_performance).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let median = median_of_descending(&values);
        ranked.truncate(top_n);

        Some(Self {
            total,
            mean,
            median,
            top,
            bottom,
            top_rows: ranked,
            values,
        })
    }

    /// Human-readable summary, one statistic per line.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Total Influencers: {}", self.total),
            format!("Mean Performance: {:.2}", self.mean),
            format!("Median Performance: {:.2}", self.median),
            format!(
                "Top Performer: {} (Performance: {:.2})",
                short_name(&self.top.face_image),
                self.top.average_performance
            ),
            format!(
                "Bottom Performer: {} (Performance: {:.2})",
                short_name(&self.bottom.face_image),
                self.bottom.average_performance
            ),
        ]
    }
}

fn median_of_descending(values: &[f64]) -> f64 {
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
