// External crates
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Internal modules
use crate::constants::{DEFAULT_DATE_COLUMN, DEFAULT_DROP_COLUMNS};
use crate::error::{ForecastError, Result};
use crate::forecast::step_4_train_model::TrainingConfig;
use crate::forecast::step_6_rolling_forecast::ForecastOrigin;

/// Where the monthly dataset lives and how to clean it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    /// CSV or Parquet file
    pub path: PathBuf,
    /// Column to forecast
    pub target: String,
    /// Columns removed before training
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    /// Column holding the month of each row; the first column is used when absent
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

impl DatasetConfig {
    pub fn new(path: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
            drop_columns: default_drop_columns(),
            date_column: default_date_column(),
        }
    }

    pub fn with_drop_columns(mut self, drop_columns: Vec<String>) -> Self {
        self.drop_columns = drop_columns;
        self
    }

    pub fn with_date_column(mut self, date_column: impl Into<String>) -> Self {
        self.date_column = date_column.into();
        self
    }
}

/// A complete rolling-forecast experiment as stored in a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub dataset: DatasetConfig,
    pub origins: Vec<ForecastOrigin>,
    #[serde(default = "default_use_target")]
    pub use_target: bool,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub parallel: bool,
}

impl RunConfig {
    /// Load a run configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: RunConfig = serde_json::from_str(&raw)?;
        if config.origins.is_empty() {
            return Err(ForecastError::ParameterMismatch(
                "run configuration lists no forecast origins".into(),
            ));
        }
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn default_drop_columns() -> Vec<String> {
    DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}

fn default_use_target() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_minimal_json_falls_back_to_defaults() {
        let raw = r#"{
            "dataset": { "path": "macro.csv", "target": "cpi" },
            "origins": [ { "date": "2019-06-01", "lag": 6, "lead": 1 } ]
        }"#;
        let config: RunConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.dataset.drop_columns, vec!["Date".to_string()]);
        assert_eq!(config.dataset.date_column, "Date");
        assert!(config.use_target);
        assert!(!config.parallel);
        assert_eq!(config.training, TrainingConfig::default());
        assert_eq!(
            config.origins[0].date,
            NaiveDate::from_ymd_opt(2019, 6, 1).unwrap()
        );
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let config = RunConfig {
            dataset: DatasetConfig::new("data.parquet", "unemployment")
                .with_drop_columns(vec![]),
            origins: vec![ForecastOrigin::new(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                3,
                2,
            )],
            use_target: false,
            training: TrainingConfig {
                epochs: 5,
                ..TrainingConfig::default()
            },
            parallel: true,
        };
        config.save_json(&path).unwrap();

        let loaded = RunConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.dataset, config.dataset);
        assert_eq!(loaded.origins, config.origins);
        assert_eq!(loaded.training.epochs, 5);
        assert!(!loaded.use_target);
        assert!(loaded.parallel);
    }

    #[test]
    fn test_config_without_origins_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(
            &path,
            r#"{ "dataset": { "path": "x.csv", "target": "y" }, "origins": [] }"#,
        )
        .unwrap();
        assert!(RunConfig::from_json_file(&path).is_err());
    }
}
