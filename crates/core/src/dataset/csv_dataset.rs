use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dataset::video_record::{DatasetColumns, VideoRecord};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open spreadsheet {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed spreadsheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet has no '{0}' column")]
    MissingColumn(String),
}

/// Loads `(video URL, performance)` rows from a CSV file.
///
/// See [`read_records`] for the row rules.
pub fn load_records(
    path: &Path,
    columns: &DatasetColumns,
) -> Result<Vec<VideoRecord>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let records = read_records(file, columns)?;
    log::info!(
        "Loaded {} unique videos from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parses spreadsheet rows from any reader.
///
/// - Both configured columns must exist in the header row.
/// - Rows with a blank URL or a performance that is not a finite number are
///   skipped with a warning.
/// - Repeated URLs keep only their first row.
pub fn read_records<R: Read>(
    reader: R,
    columns: &DatasetColumns,
) -> Result<Vec<VideoRecord>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let url_idx = column_index(&headers, &columns.url)?;
    let perf_idx = column_index(&headers, &columns.performance)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut duplicates = 0usize;

    for (i, result) in csv_reader.records().enumerate() {
        let row = i + 1;
        let record = result?;

        let url = record.get(url_idx).unwrap_or_default();
        if url.is_empty() {
            log::warn!("Row {row}: missing video URL, skipping");
            continue;
        }

        let raw_perf = record.get(perf_idx).unwrap_or_default();
        let Some(performance) = parse_performance(raw_perf) else {
            log::warn!("Row {row}: performance '{raw_perf}' is not a number, skipping");
            continue;
        };

        if !seen.insert(url.to_string()) {
            duplicates += 1;
            continue;
        }

        records.push(VideoRecord {
            url: url.to_string(),
            performance,
            row,
        });
    }

    if duplicates > 0 {
        log::info!("Dropped {duplicates} rows with a repeated video URL");
    }
    Ok(records)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == name)
        .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
}

fn parse_performance(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
