use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::video_record::DatasetColumns;
use crate::identity::identity_matcher::MatchMode;
use crate::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_SAMPLE_INTERVAL, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_N,
    PERFORMANCE_COLUMN, URL_COLUMN,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Tunables for a pipeline run, loadable from a JSON file.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    /// Run detection on every N-th frame.
    pub sample_interval: usize,
    /// Minimum detector confidence.
    pub confidence: f64,
    pub match_mode: MatchMode,
    /// Cosine similarity at or above which two faces are the same person.
    pub similarity_threshold: f64,
    /// Rows shown in the chart.
    pub top_n: usize,
    pub url_column: String,
    pub performance_column: String,
    pub models_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            confidence: DEFAULT_CONFIDENCE,
            match_mode: MatchMode::Cosine,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            url_column: URL_COLUMN.to_string(),
            performance_column: PERFORMANCE_COLUMN.to_string(),
            models_dir: None,
        }
    }
}

impl PipelineSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Loaded settings from {}: {settings:?}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval == 0 {
            return Err(ConfigError::Invalid(
                "sample_interval must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::Invalid(format!(
                "confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be between -1.0 and 1.0, got {}",
                self.similarity_threshold
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.url_column.trim().is_empty() || self.performance_column.trim().is_empty() {
            return Err(ConfigError::Invalid("column names must not be empty".into()));
        }
        Ok(())
    }

    pub fn columns(&self) -> DatasetColumns {
        DatasetColumns {
            url: self.url_column.clone(),
            performance: self.performance_column.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_json(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("settings.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = PipelineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.sample_interval, 10);
        assert_eq!(settings.match_mode, MatchMode::Cosine);
        assert_eq!(settings.columns(), DatasetColumns::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, r#"{ "sample_interval": 5, "match_mode": "exact" }"#);

        let settings = PipelineSettings::load(&path).unwrap();
        assert_eq!(settings.sample_interval, 5);
        assert_eq!(settings.match_mode, MatchMode::Exact);
        assert_eq!(settings.top_n, DEFAULT_TOP_N);
        assert_eq!(settings.models_dir, None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = PipelineSettings {
            similarity_threshold: 0.55,
            url_column: "Link".into(),
            models_dir: Some(PathBuf::from("/opt/models")),
            ..Default::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(PipelineSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, r#"{ "sample_intervall": 5 }"#);
        assert!(matches!(
            PipelineSettings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "{ not json");
        assert!(matches!(
            PipelineSettings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PipelineSettings::load(Path::new("/nonexistent/settings.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[rstest]
    #[case(PipelineSettings { sample_interval: 0, ..Default::default() })]
    #[case(PipelineSettings { confidence: 1.5, ..Default::default() })]
    #[case(PipelineSettings { confidence: -0.1, ..Default::default() })]
    #[case(PipelineSettings { similarity_threshold: 1.2, ..Default::default() })]
    #[case(PipelineSettings { top_n: 0, ..Default::default() })]
    #[case(PipelineSettings { performance_column: " ".into(), ..Default::default() })]
    fn test_validate_rejects(#[case] settings: PipelineSettings) {
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }
}
