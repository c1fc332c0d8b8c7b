// External imports
use burn::tensor::backend::AutodiffBackend;
use chrono::NaiveDate;
use log::{info, warn};
use ndarray::Array2;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

// Internal imports
use super::step_1_supervised_frame::{prune_to_label, series_to_supervised, SupervisedFrame};
use super::step_4_train_model::{fit_model, FitHistory, TrainingConfig};
use super::step_5_prediction::{descale_target, latest_features, predict_scaled};
use crate::config::DatasetConfig;
use crate::constants::{PREDICTION_SUFFIX, RMSE_DECIMALS};
use crate::dataset::MonthlyDataset;
use crate::error::{ForecastError, Result};
use crate::util::file_utils::load_dataset;
use crate::util::metrics::{rmse, round_to};
use crate::util::scaler::MinMaxScaler;

/// A month to forecast together with its own window sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastOrigin {
    pub date: NaiveDate,
    pub lag: usize,
    pub lead: usize,
}

impl ForecastOrigin {
    pub fn new(date: NaiveDate, lag: usize, lead: usize) -> Self {
        Self { date, lag, lead }
    }
}

/// Outcome of one forecast origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub lag: usize,
    pub lead: usize,
    pub predicted: f64,
    pub actual: f64,
    pub train_rows: usize,
    /// Validation losses in here are scored on the forecast point itself
    pub history: FitHistory,
}

/// Forecasts of a rolling run with their aggregate error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    target: String,
    records: Vec<ForecastRecord>,
    rmse: f64,
    raw_rmse: f64,
}

impl ForecastReport {
    /// Collect records and compute their RMSE
    pub fn new(target: impl Into<String>, records: Vec<ForecastRecord>) -> Result<Self> {
        let predictions: Vec<f64> = records.iter().map(|r| r.predicted).collect();
        let actuals: Vec<f64> = records.iter().map(|r| r.actual).collect();
        let raw_rmse = rmse(&predictions, &actuals)?;

        Ok(Self {
            target: target.into(),
            records,
            rmse: round_to(raw_rmse, RMSE_DECIMALS),
            raw_rmse,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    /// RMSE rounded to two decimals
    pub fn rmse(&self) -> f64 {
        self.rmse
    }

    pub fn raw_rmse(&self) -> f64 {
        self.raw_rmse
    }

    pub fn predictions(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.predicted).collect()
    }

    pub fn actuals(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.actual).collect()
    }

    pub fn summary_line(&self) -> String {
        format!("Test RMSE: {:.3}", self.raw_rmse)
    }

    /// Date-indexed result table with predicted and actual target columns
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = self
            .records
            .iter()
            .map(|r| r.date.format("%Y-%m-%d").to_string())
            .collect();

        DataFrame::new(vec![
            Column::new("Date".into(), dates),
            Column::new(
                format!("{}{}", self.target, PREDICTION_SUFFIX).into(),
                self.predictions(),
            ),
            Column::new(self.target.as_str().into(), self.actuals()),
        ])
    }
}

/// Training rows and the single test row for one origin
#[derive(Debug, Clone)]
pub struct OriginWindows {
    pub split: usize,
    pub train: SupervisedFrame,
    pub test: SupervisedFrame,
}

/// Row of the windowed table whose label falls on the origin month
pub fn split_index(position: usize, lag: usize, lead: usize) -> i64 {
    position as i64 - lag as i64 - lead as i64 + 1
}

/// Window the whole scaled matrix for one origin and split it at the origin
///
/// # Arguments
///
/// * `scaled` - Scaled matrix [months, variables] with the target in column 0
/// * `position` - Row of the origin month in the dataset index
/// * `origin` - Origin date with its lag and lead
/// * `include_target` - Whether the target is among the lagged predictors
///
/// # Returns
///
/// Returns every windowed row before the split as training data and the row
/// at the split as the test point
pub fn prepare_origin(
    scaled: &Array2<f64>,
    position: usize,
    origin: &ForecastOrigin,
    include_target: bool,
) -> Result<OriginWindows> {
    let n_vars = scaled.ncols();
    let reframed = series_to_supervised(scaled, origin.lag, origin.lead, true, include_target)?;
    let windowed = prune_to_label(&reframed, n_vars, origin.lead)?;

    let split = split_index(position, origin.lag, origin.lead);
    // At least one training row in front of the test row
    if split < 1 || split >= windowed.n_rows() as i64 {
        return Err(ForecastError::SplitOutOfRange {
            date: origin.date,
            lag: origin.lag,
            lead: origin.lead,
            split,
            rows: windowed.n_rows(),
        });
    }
    let split = split as usize;

    Ok(OriginWindows {
        split,
        train: windowed.rows(0, split),
        test: windowed.rows(split, split + 1),
    })
}

/// Trains one model per forecast origin over a fixed, scaled dataset
pub struct RollingForecaster<B: AutodiffBackend> {
    dataset: MonthlyDataset,
    scaler: MinMaxScaler,
    scaled: Array2<f64>,
    training: TrainingConfig,
    parallel: bool,
    device: B::Device,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> RollingForecaster<B> {
    /// Fit the scaler on `dataset` and prepare for forecasting
    pub fn new(dataset: MonthlyDataset, training: TrainingConfig, device: B::Device) -> Result<Self> {
        let (scaler, scaled) = MinMaxScaler::fit_transform(dataset.values())?;
        Ok(Self {
            dataset,
            scaler,
            scaled,
            training,
            parallel: false,
            device,
            _backend: PhantomData,
        })
    }

    /// Load the dataset described by `config` and prepare for forecasting
    pub fn from_config(
        config: &DatasetConfig,
        training: TrainingConfig,
        device: B::Device,
    ) -> Result<Self> {
        let dataset = load_dataset(config)?;
        Self::new(dataset, training, device)
    }

    /// Train origins concurrently; results keep the input order
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn dataset(&self) -> &MonthlyDataset {
        &self.dataset
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn scaled(&self) -> &Array2<f64> {
        &self.scaled
    }

    pub fn training(&self) -> &TrainingConfig {
        &self.training
    }

    /// Forecast every date with its own lag and lead
    ///
    /// # Arguments
    ///
    /// * `dates` - Forecast origins
    /// * `lags` - Lag per origin
    /// * `leads` - Lead per origin
    /// * `use_target` - Whether the target is among the lagged predictors
    ///
    /// # Returns
    ///
    /// Returns one record per date and the RMSE over all of them
    pub fn run(
        &self,
        dates: &[NaiveDate],
        lags: &[usize],
        leads: &[usize],
        use_target: bool,
    ) -> Result<ForecastReport> {
        if dates.len() != lags.len() || dates.len() != leads.len() {
            return Err(ForecastError::ParameterMismatch(format!(
                "{} dates, {} lags and {} leads",
                dates.len(),
                lags.len(),
                leads.len()
            )));
        }

        let origins: Vec<ForecastOrigin> = dates
            .iter()
            .zip(lags.iter().zip(leads))
            .map(|(&date, (&lag, &lead))| ForecastOrigin::new(date, lag, lead))
            .collect();
        self.run_origins(&origins, use_target)
    }

    /// Forecast every origin and aggregate the results
    pub fn run_origins(&self, origins: &[ForecastOrigin], use_target: bool) -> Result<ForecastReport> {
        if origins.is_empty() {
            return Err(ForecastError::ParameterMismatch(
                "no forecast origins given".into(),
            ));
        }

        warn!(
            "Validation losses are scored on each held-out forecast point and are not an independent error estimate"
        );

        let records = if self.parallel {
            origins
                .par_iter()
                .map(|origin| self.forecast_origin(origin, use_target))
                .collect::<Result<Vec<_>>>()?
        } else {
            origins
                .iter()
                .map(|origin| self.forecast_origin(origin, use_target))
                .collect::<Result<Vec<_>>>()?
        };

        let report = ForecastReport::new(self.dataset.target(), records)?;
        info!("{}", report.summary_line());
        Ok(report)
    }

    /// Train a fresh model for one origin and forecast it
    pub fn forecast_origin(&self, origin: &ForecastOrigin, use_target: bool) -> Result<ForecastRecord> {
        let position = self
            .dataset
            .position_of(origin.date)
            .ok_or(ForecastError::DateNotFound(origin.date))?;
        let windows = prepare_origin(&self.scaled, position, origin, use_target)?;

        let fit_error = |e: anyhow::Error| ForecastError::Fit {
            date: origin.date,
            reason: format!("{:#}", e),
        };

        let (model, history) = fit_model::<B>(
            windows.train.predictors(),
            windows.train.labels(),
            windows.test.predictors(),
            windows.test.labels(),
            &self.training,
            &self.device,
        )
        .map_err(fit_error)?;

        let scaled_prediction = predict_scaled(&model, windows.test.predictors(), &self.device)
            .map_err(|e| ForecastError::Fit {
                date: origin.date,
                reason: e.to_string(),
            })?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Fit {
                date: origin.date,
                reason: "model returned no prediction".into(),
            })?;

        let test_row = windows.test.predictors().row(0).to_vec();
        let features = latest_features(&test_row, self.scaled.ncols(), use_target)?;
        let predicted = descale_target(&self.scaler, scaled_prediction, &features)?;
        let actual = descale_target(&self.scaler, windows.test.labels()[0], &features)?;

        info!(
            "{} (lag {}, lead {}): predicted {:.3}, actual {:.3}, {} training rows",
            origin.date,
            origin.lag,
            origin.lead,
            predicted,
            actual,
            windows.split
        );

        Ok(ForecastRecord {
            date: origin.date,
            lag: origin.lag,
            lead: origin.lead,
            predicted,
            actual,
            train_rows: windows.split,
            history,
        })
    }
}
