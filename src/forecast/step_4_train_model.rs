// External imports
use anyhow::{bail, Result};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::cast::ToElement;
use burn::tensor::Tensor;
use log::debug;
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

// Internal imports
use super::step_1_supervised_frame::{labels_to_tensor, predictors_to_tensor};
use super::step_3_lstm_model_arch::{ForecastLstm, ForecastLstmConfig};
use crate::constants::{
    ADAM_EPSILON, BATCH_SIZE, DROPOUT_RATE, EPOCHS, LEARNING_RATE, LOSS_EPSILON, LSTM_HIDDEN_SIZE,
};

/// Configuration for fitting one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub hidden_size: usize,
    pub dropout: f64,
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    /// Reshuffle training rows before every epoch
    pub shuffle: bool,
    /// Seeds weight initialisation and batch order
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden_size: LSTM_HIDDEN_SIZE,
            dropout: DROPOUT_RATE,
            learning_rate: LEARNING_RATE,
            epochs: EPOCHS,
            batch_size: BATCH_SIZE,
            shuffle: true,
            seed: None,
        }
    }
}

/// Per-epoch losses recorded while fitting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitHistory {
    pub loss: Vec<f64>,
    pub val_loss: Vec<f64>,
}

impl FitHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.val_loss.last().copied()
    }
}

/// Root-mean-squared error of each sample over its output units
///
/// # Arguments
///
/// * `predictions` - Tensor of shape [batch_size, outputs]
/// * `targets` - Tensor of shape [batch_size, outputs]
///
/// # Returns
///
/// Returns a tensor of shape [batch_size]
pub fn root_mean_squared_error<B: Backend>(
    predictions: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let batch_size = predictions.dims()[0];
    (predictions - targets)
        .powf_scalar(2.0)
        .mean_dim(1)
        .add_scalar(LOSS_EPSILON)
        .sqrt()
        .reshape([batch_size])
}

/// Fit a freshly initialised model on single-timestep windows
///
/// # Arguments
///
/// * `train_x` - Predictor rows of shape [samples, features]
/// * `train_y` - One label per training row
/// * `val_x` - Predictor rows scored after every epoch
/// * `val_y` - Labels of the validation rows
/// * `config` - Architecture and optimisation settings
/// * `device` - Device to place tensors on
///
/// # Returns
///
/// Returns the trained model and its per-epoch loss history
pub fn fit_model<B: AutodiffBackend>(
    train_x: ArrayView2<f64>,
    train_y: ArrayView1<f64>,
    val_x: ArrayView2<f64>,
    val_y: ArrayView1<f64>,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(ForecastLstm<B>, FitHistory)> {
    let n_samples = train_x.nrows();
    if n_samples == 0 {
        bail!("no training rows");
    }
    if train_y.len() != n_samples || val_y.len() != val_x.nrows() {
        bail!("predictor and label row counts differ");
    }
    if val_x.ncols() != train_x.ncols() {
        bail!(
            "validation rows have {} columns, training rows {}",
            val_x.ncols(),
            train_x.ncols()
        );
    }
    if config.batch_size == 0 || config.epochs == 0 {
        bail!("batch size and epoch count must be positive");
    }
    if !(0.0..=1.0).contains(&config.dropout) {
        bail!("dropout must lie in [0, 1], got {}", config.dropout);
    }

    let mut rng = match config.seed {
        Some(seed) => {
            B::seed(seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let mut model: ForecastLstm<B> = ForecastLstmConfig::new(train_x.ncols())
        .with_hidden_size(config.hidden_size)
        .with_dropout_rate(config.dropout)
        .init(device);
    let mut optimizer = AdamConfig::new()
        .with_epsilon(ADAM_EPSILON)
        .init::<B, ForecastLstm<B>>();

    let val_features = predictors_to_tensor::<B>(val_x, device);
    let val_targets = labels_to_tensor::<B>(val_y, device);

    let mut history = FitHistory::default();
    let mut order: Vec<usize> = (0..n_samples).collect();

    for epoch in 1..=config.epochs {
        if config.shuffle {
            order.shuffle(&mut rng);
        }

        let mut epoch_loss = 0.0;
        for batch in order.chunks(config.batch_size) {
            let features = predictors_to_tensor::<B>(train_x.select(Axis(0), batch).view(), device);
            let targets = labels_to_tensor::<B>(train_y.select(Axis(0), batch).view(), device);

            let loss = root_mean_squared_error(model.forward(features, true), targets).mean();
            let loss_value = loss.clone().into_scalar().to_f64();
            if !loss_value.is_finite() {
                bail!("training loss became {} at epoch {}", loss_value, epoch);
            }
            epoch_loss += loss_value * batch.len() as f64;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }
        let train_loss = epoch_loss / n_samples as f64;

        let val_loss = if val_x.nrows() == 0 {
            f64::NAN
        } else {
            root_mean_squared_error(model.predict(val_features.clone()), val_targets.clone())
                .mean()
                .into_scalar()
                .to_f64()
        };

        debug!(
            "Epoch {}/{}: loss = {:.6}, val_loss = {:.6}",
            epoch, config.epochs, train_loss, val_loss
        );
        history.loss.push(train_loss);
        history.val_loss.push(val_loss);
    }

    Ok((model, history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_autodiff::Autodiff;
    use burn_ndarray::{NdArray, NdArrayDevice};
    use ndarray::{Array1, Array2};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            hidden_size: 8,
            epochs: 30,
            batch_size: 16,
            learning_rate: 0.01,
            seed: Some(42),
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_default_training_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.hidden_size, 50);
        assert_eq!(config.epochs, 25);
        assert_eq!(config.batch_size, 72);
        assert!(config.shuffle);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_rmse_loss_is_per_sample_absolute_error_for_single_output() {
        let device = NdArrayDevice::default();
        let predictions = Tensor::<NdArray, 1>::from_data([0.5f32, 0.2, 0.9].as_slice(), &device)
            .reshape([3, 1]);
        let targets = Tensor::<NdArray, 1>::from_data([0.1f32, 0.2, 0.4].as_slice(), &device)
            .reshape([3, 1]);

        let loss = root_mean_squared_error(predictions, targets);
        assert_eq!(loss.dims(), [3]);

        let values = loss.into_data().to_vec::<f32>().unwrap();
        for (value, expected) in values.iter().zip([0.4f32, 0.0, 0.5]) {
            assert!((value - expected).abs() < 1e-4, "{} != {}", value, expected);
        }
    }

    #[test]
    fn test_fit_records_one_loss_per_epoch_and_learns() {
        let device = NdArrayDevice::default();
        // y = mean of the two predictors
        let x = Array2::from_shape_fn((64, 2), |(i, j)| ((i * (j + 3)) % 17) as f64 / 17.0);
        let y = Array1::from_shape_fn(64, |i| (x[[i, 0]] + x[[i, 1]]) / 2.0);

        let (_, history) = fit_model::<TestBackend>(
            x.view(),
            y.view(),
            x.slice(ndarray::s![..1, ..]),
            y.slice(ndarray::s![..1]),
            &quick_config(),
            &device,
        )
        .unwrap();

        assert_eq!(history.loss.len(), 30);
        assert_eq!(history.val_loss.len(), 30);
        assert!(history.loss.iter().all(|l| l.is_finite()));
        assert!(history.final_loss().unwrap() < history.loss[0]);
    }

    #[test]
    fn test_fit_rejects_dropout_outside_unit_interval() {
        let device = NdArrayDevice::default();
        let x = Array2::from_elem((8, 2), 0.5);
        let y = Array1::from_elem(8, 0.5);

        for dropout in [1.5, -0.1, f64::NAN] {
            let config = TrainingConfig {
                dropout,
                ..quick_config()
            };
            let result = fit_model::<TestBackend>(
                x.view(),
                y.view(),
                x.slice(ndarray::s![..1, ..]),
                y.slice(ndarray::s![..1]),
                &config,
                &device,
            );
            let message = format!("{:#}", result.err().unwrap());
            assert!(message.contains("dropout"), "{}", message);
        }
    }

    #[test]
    fn test_fit_rejects_empty_training_set() {
        let device = NdArrayDevice::default();
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<f64>::zeros(0);
        let val_x = Array2::<f64>::zeros((1, 3));
        let val_y = Array1::<f64>::zeros(1);

        let result = fit_model::<TestBackend>(
            x.view(),
            y.view(),
            val_x.view(),
            val_y.view(),
            &quick_config(),
            &device,
        );
        assert!(result.is_err());
    }
}
