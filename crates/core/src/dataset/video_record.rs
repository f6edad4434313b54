use crate::shared::constants::{PERFORMANCE_COLUMN, URL_COLUMN};

/// One spreadsheet row: a video and the performance score it earned.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoRecord {
    pub url: String,
    pub performance: f64,
    /// 1-based data row in the source spreadsheet (header excluded).
    pub row: usize,
}

/// Header names of the columns holding the video URL and its score.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetColumns {
    pub url: String,
    pub performance: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            url: URL_COLUMN.to_string(),
            performance: PERFORMANCE_COLUMN.to_string(),
        }
    }
}
