/// Crate-level test suites
///
/// * `file_utils_tests` - Loading CSV and Parquet tables into a monthly dataset
/// * `rolling_forecast_tests` - Per-origin windowing and full rolling runs on synthetic data
pub mod file_utils_tests;
