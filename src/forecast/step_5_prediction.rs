// External imports
use burn::tensor::backend::Backend;
use ndarray::{Array2, ArrayView2};

// Internal imports
use super::step_1_supervised_frame::predictors_to_tensor;
use super::step_3_lstm_model_arch::ForecastLstm;
use crate::error::{ForecastError, Result};
use crate::util::scaler::MinMaxScaler;

/// Predict the scaled label of every predictor row
///
/// # Arguments
///
/// * `model` - Trained model
/// * `predictors` - Rows of shape [samples, features]
/// * `device` - Device to place tensors on
///
/// # Returns
///
/// Returns one scaled prediction per row
pub fn predict_scaled<B: Backend>(
    model: &ForecastLstm<B>,
    predictors: ArrayView2<f64>,
    device: &B::Device,
) -> Result<Vec<f64>> {
    let input = predictors_to_tensor::<B>(predictors, device);
    let output = model.predict(input);
    let values = output
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| ForecastError::InputShape(format!("cannot read predictions back: {:?}", e)))?;
    Ok(values.into_iter().map(f64::from).collect())
}

/// Non-target variables of the most recent month in a predictor row
///
/// The last lagged block holds every variable when the target is among the
/// predictors and only the non-target variables otherwise.
pub fn latest_features(
    predictor_row: &[f64],
    n_vars: usize,
    include_target: bool,
) -> Result<Vec<f64>> {
    let block = if include_target { n_vars } else { n_vars.saturating_sub(1) };
    if n_vars == 0 || predictor_row.len() < block {
        return Err(ForecastError::InputShape(format!(
            "predictor row of {} values has no block of {} variables",
            predictor_row.len(),
            block
        )));
    }

    let latest = &predictor_row[predictor_row.len() - block..];
    Ok(if include_target {
        latest[1..].to_vec()
    } else {
        latest.to_vec()
    })
}

/// Map a scaled target value back into real units
///
/// The value is placed in the target column next to `features` and the full
/// row goes through the scaler's inverse transform.
pub fn descale_target(
    scaler: &MinMaxScaler,
    scaled_target: f64,
    features: &[f64],
) -> Result<f64> {
    let mut row = Vec::with_capacity(features.len() + 1);
    row.push(scaled_target);
    row.extend_from_slice(features);

    let width = row.len();
    let restored = scaler.inverse_transform(&Array2::from_shape_vec((1, width), row)?)?;
    Ok(restored[[0, 0]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::step_3_lstm_model_arch::ForecastLstmConfig;
    use burn_ndarray::{NdArray, NdArrayDevice};
    use ndarray::array;

    #[test]
    fn test_latest_features_with_target_history() {
        // two lag months of three variables
        let row = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        assert_eq!(latest_features(&row, 3, true).unwrap(), vec![0.5, 0.6]);
    }

    #[test]
    fn test_latest_features_without_target_history() {
        let row = [0.2, 0.3, 0.5, 0.6];
        assert_eq!(latest_features(&row, 3, false).unwrap(), vec![0.5, 0.6]);
    }

    #[test]
    fn test_descale_target_uses_target_bounds() {
        let data = array![[100.0, 1.0, 50.0], [200.0, 3.0, 70.0]];
        let scaler = MinMaxScaler::fit(&data).unwrap();

        let value = descale_target(&scaler, 0.25, &[0.5, 0.5]).unwrap();
        assert!((value - 125.0).abs() < 1e-9);

        let value = descale_target(&scaler, 1.0, &[0.0, 0.0]).unwrap();
        assert!((value - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_descale_target_rejects_wrong_width() {
        let scaler = MinMaxScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(descale_target(&scaler, 0.5, &[0.1, 0.2]).is_err());
    }

    #[test]
    fn test_predict_scaled_returns_one_value_per_row() {
        let device = NdArrayDevice::default();
        let model = ForecastLstmConfig::new(4).init::<NdArray>(&device);
        let rows = Array2::from_elem((3, 4), 0.5);

        let predictions = predict_scaled(&model, rows.view(), &device).unwrap();
        assert_eq!(predictions.len(), 3);
        assert!(predictions.iter().all(|p| p.is_finite()));
    }
}
