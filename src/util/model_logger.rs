use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::built_info;
use crate::forecast::step_4_train_model::TrainingConfig;
use crate::forecast::step_6_rolling_forecast::{ForecastRecord, ForecastReport};

/// JSON record of one rolling-forecast run
#[derive(Debug, Serialize, Deserialize)]
pub struct ForecastExperiment {
    pub timestamp: String,
    pub crate_version: String,
    pub dataset: String,
    pub target: String,
    pub use_target: bool,
    pub training: TrainingConfig,
    pub records: Vec<ForecastRecord>,
    pub rmse: Option<f64>,
    pub raw_rmse: Option<f64>,
    pub training_time_seconds: Option<f64>,
    pub notes: String,
}

impl ForecastExperiment {
    pub fn new(dataset: &Path, target: &str, use_target: bool, training: &TrainingConfig) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            crate_version: built_info::PKG_VERSION.to_string(),
            dataset: dataset.display().to_string(),
            target: target.to_string(),
            use_target,
            training: training.clone(),
            records: Vec::new(),
            rmse: None,
            raw_rmse: None,
            training_time_seconds: None,
            notes: String::new(),
        }
    }

    pub fn set_report(&mut self, report: &ForecastReport) {
        self.records = report.records().to_vec();
        self.rmse = Some(report.rmse());
        self.raw_rmse = Some(report.raw_rmse());
    }

    pub fn set_training_time(&mut self, seconds: f64) {
        self.training_time_seconds = Some(seconds);
    }

    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }

    pub fn save(&self, experiment_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(experiment_dir)
            .with_context(|| format!("cannot create {}", experiment_dir.display()))?;

        let filename = format!(
            "{}_{}_h{}_e{}_experiment.json",
            self.target,
            if self.use_target { "with_target" } else { "without_target" },
            self.training.hidden_size,
            self.training.epochs,
        );
        let file_path = experiment_dir.join(filename);

        let json = serde_json::to_string_pretty(&self)?;
        let mut file = fs::File::create(&file_path)
            .with_context(|| format!("cannot create {}", file_path.display()))?;
        file.write_all(json.as_bytes())?;

        Ok(file_path)
    }
}

/// Timestamped experiment directory under `root`
pub fn create_experiment_dir(root: &Path) -> Result<PathBuf> {
    let dir = root.join(Local::now().format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::step_4_train_model::FitHistory;
    use chrono::NaiveDate;

    #[test]
    fn test_experiment_saves_report_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let record = ForecastRecord {
            date: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
            lag: 6,
            lead: 1,
            predicted: 101.0,
            actual: 100.0,
            train_rows: 23,
            history: FitHistory::default(),
        };
        let report = ForecastReport::new("cpi", vec![record]).unwrap();

        let mut experiment =
            ForecastExperiment::new(Path::new("macro.csv"), "cpi", true, &TrainingConfig::default());
        experiment.set_report(&report);
        experiment.set_training_time(1.5);
        experiment.add_note("first run");
        experiment.add_note("second line");

        let path = experiment.save(dir.path()).unwrap();
        assert!(path.ends_with("cpi_with_target_h50_e25_experiment.json"));

        let saved: ForecastExperiment =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.records.len(), 1);
        assert_eq!(saved.rmse, Some(1.0));
        assert_eq!(saved.notes, "first run\nsecond line");
    }
}
