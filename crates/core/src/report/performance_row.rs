use serde::{Deserialize, Serialize};

/// One line of the results table: a face thumbnail and the mean performance
/// of the videos it appeared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    #[serde(rename = "Face Image")]
    pub face_image: String,
    #[serde(rename = "Average Performance")]
    pub average_performance: f64,
}

impl PerformanceRow {
    pub fn new(face_image: impl Into<String>, average_performance: f64) -> Self {
        Self {
            face_image: face_image.into(),
            average_performance,
        }
    }
}
