//! Chart of the ranked results, drawn with `plotters`: a horizontal bar chart
//! of the top performers above a histogram of every performance value.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::report::performance_row::PerformanceRow;
use crate::report::ranking::{short_name, Insights};
use crate::report::report_error::ReportError;

const SIZE: (u32, u32) = (1200, 1000);
const FONT: &str = "sans-serif";
const HISTOGRAM_BINS: u32 = 10;
const HISTOGRAM_FILL: RGBColor = RGBColor(135, 206, 235);

pub fn render_svg(insights: &Insights) -> Result<String, ReportError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        draw(&root, insights).map_err(|e| ReportError::Chart(e.to_string()))?;
    }
    Ok(svg)
}

pub fn write_svg(path: &Path, insights: &Insights) -> Result<(), ReportError> {
    std::fs::write(path, render_svg(insights)?).map_err(|e| ReportError::io(path, e))?;
    log::info!("Chart saved to {}", path.display());
    Ok(())
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    insights: &Insights,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(SIZE.1 as i32 * 3 / 5);
    draw_top_rows(&upper, &insights.top_rows)?;
    draw_distribution(&lower, &insights.values)?;
    root.present()
}

/// Best row on top. Bars start at zero, so negative averages point left.
fn draw_top_rows<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rows: &[PerformanceRow],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if rows.is_empty() {
        return Ok(());
    }
    let n = rows.len() as u32;
    let values: Vec<f64> = rows
        .iter()
        .map(|r| {
            if r.average_performance.is_finite() {
                r.average_performance
            } else {
                0.0
            }
        })
        .collect();
    let (lo, hi) = value_axis(&values);
    let slot = |rank: usize| n - 1 - rank as u32;

    let label = |v: &SegmentValue<u32>| match v {
        SegmentValue::Exact(s) | SegmentValue::CenterOf(s) if *s < n => {
            short_name(&rows[(n - 1 - s) as usize].face_image).to_string()
        }
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("Top {n} Influencers Performance"),
            (FONT, 24.0).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(180)
        .build_cartesian_2d(lo..hi, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(rows.len() + 1)
        .y_label_formatter(&label)
        .x_desc("Average Performance")
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(rank, &v)| {
        let s = slot(rank);
        let mut bar = Rectangle::new(
            [(0.0, SegmentValue::Exact(s)), (v, SegmentValue::Exact(s + 1))],
            rank_color(rank, rows.len()).filled(),
        );
        bar.set_margin(3, 3, 0, 0);
        bar
    }))?;

    chart.draw_series(values.iter().zip(rows).enumerate().map(|(rank, (&v, row))| {
        Text::new(
            format!("{:.2}", row.average_performance),
            (v.max(0.0), SegmentValue::CenterOf(slot(rank))),
            (FONT, 12.0).into_font().color(&BLACK.mix(0.6)),
        )
    }))?;

    Ok(())
}

fn draw_distribution<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(bins) = Bins::over(&finite, HISTOGRAM_BINS) else {
        return Ok(());
    };
    let tallest = bins.tallest(&finite);

    let center = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) if *i < HISTOGRAM_BINS => format!("{:.2}", bins.center(*i)),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(
            "Distribution of Influencer Performances",
            (FONT, 20.0).into_font(),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..HISTOGRAM_BINS).into_segmented(), 0..tallest + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(HISTOGRAM_BINS as usize + 1)
        .x_label_formatter(&center)
        .x_desc("Average Performance")
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(HISTOGRAM_FILL.filled())
            .margin(1)
            .data(finite.iter().map(|&v| (bins.index_of(v), 1u32))),
    )?;

    Ok(())
}

/// X range covering zero and every value, with room for the value labels.
fn value_axis(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(0.0, f64::min);
    let hi = values.iter().copied().fold(0.0, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let lo = if lo < 0.0 { lo - span * 0.05 } else { lo };
    (lo, hi + span * 0.15)
}

/// Equal-width bins over `[min, max]`. The last bin is closed on the right.
struct Bins {
    lo: f64,
    width: f64,
    count: u32,
}

impl Bins {
    /// A single distinct value gets one unit-wide range around it.
    fn over(values: &[f64], count: u32) -> Option<Self> {
        if values.is_empty() || count == 0 {
            return None;
        }
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            lo -= 0.5;
            hi += 0.5;
        }
        Some(Self {
            lo,
            width: (hi - lo) / count as f64,
            count,
        })
    }

    fn index_of(&self, value: f64) -> u32 {
        (((value - self.lo) / self.width) as u32).min(self.count - 1)
    }

    fn center(&self, index: u32) -> f64 {
        self.lo + (index as f64 + 0.5) * self.width
    }

    fn tallest(&self, values: &[f64]) -> u32 {
        let mut counts = vec![0u32; self.count as usize];
        for &v in values {
            counts[self.index_of(v) as usize] += 1;
        }
        counts.into_iter().max().unwrap_or(0)
    }
}

/// Cool blue for the best row through pale grey to warm red for the last.
fn rank_color(rank: usize, count: usize) -> HSLColor {
    let t = if count > 1 {
        rank as f64 / (count - 1) as f64
    } else {
        0.0
    };
    let distance = (2.0 * t - 1.0).abs();
    let hue = if t < 0.5 { 0.63 } else { 0.97 };
    HSLColor(hue, 0.1 + 0.55 * distance, 0.85 - 0.35 * distance)
}
