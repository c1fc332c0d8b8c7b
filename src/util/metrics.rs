use crate::error::{ForecastError, Result};

/// Root-mean-squared error between two equally long series
pub fn rmse(predictions: &[f64], actuals: &[f64]) -> Result<f64> {
    if predictions.len() != actuals.len() {
        return Err(ForecastError::ParameterMismatch(format!(
            "{} predictions against {} actuals",
            predictions.len(),
            actuals.len()
        )));
    }
    if predictions.is_empty() {
        return Err(ForecastError::ParameterMismatch(
            "cannot compute RMSE over zero forecasts".into(),
        ));
    }

    let mse = predictions
        .iter()
        .zip(actuals)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / predictions.len() as f64;
    Ok(mse.sqrt())
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
