use chrono::NaiveDate;
use polars::error::PolarsError;
use thiserror::Error;

/// Errors raised while loading a dataset or running a rolling forecast.
///
/// Every variant is fatal for the run: the forecaster never returns a partial
/// report.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("input shape error: {0}")]
    InputShape(String),

    #[error("forecast origin {0} not found in the dataset index")]
    DateNotFound(NaiveDate),

    #[error(
        "split index {split} for origin {date} (lag {lag}, lead {lead}) is outside the windowed table of {rows} rows"
    )]
    SplitOutOfRange {
        date: NaiveDate,
        lag: usize,
        lead: usize,
        split: i64,
        rows: usize,
    },

    #[error("model fit failed for origin {date}: {reason}")]
    Fit { date: NaiveDate, reason: String },

    #[error("parameter mismatch: {0}")]
    ParameterMismatch(String),

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("cannot parse '{0}' as a date")]
    InvalidDate(String),

    #[error("month {0} appears more than once in the dataset index")]
    DuplicateDate(NaiveDate),

    #[error("dataset is empty after cleaning")]
    EmptyDataset,

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Data(#[from] PolarsError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
