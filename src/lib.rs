pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod forecast;
#[cfg(test)]
pub mod test;
pub mod util {
    pub mod file_utils;
    pub mod metrics;
    pub mod model_logger;
    pub mod scaler;
    #[cfg(test)]
    pub mod test_utils;
}

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use config::{DatasetConfig, RunConfig};
pub use dataset::MonthlyDataset;
pub use error::{ForecastError, Result};
pub use forecast::step_4_train_model::TrainingConfig;
pub use forecast::step_6_rolling_forecast::{
    ForecastOrigin, ForecastRecord, ForecastReport, RollingForecaster,
};
