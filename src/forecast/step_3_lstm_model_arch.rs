// External imports
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

// Internal imports
use super::step_2_lstm_cell::LstmCell;
use crate::constants::{DROPOUT_RATE, LSTM_HIDDEN_SIZE, OUTPUT_SIZE};

/// One recurrent layer, a dropout layer and a dense output unit
#[derive(Module, Debug)]
pub struct ForecastLstm<B: Backend> {
    // Model hyperparameters
    input_size: usize,
    hidden_size: usize,
    output_size: usize,

    // Model layers
    lstm: LstmCell<B>,
    dropout: Dropout,
    output_layer: Linear<B>,
}

impl<B: Backend> ForecastLstm<B> {
    /// Create a new forecasting model
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of predictor columns per timestep
    /// * `hidden_size` - Width of the recurrent layer
    /// * `output_size` - Size of output (1 for a single label)
    /// * `dropout_rate` - Dropout applied to the recurrent output while training
    /// * `device` - Device to place tensors on
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        dropout_rate: f64,
        device: &B::Device,
    ) -> Self {
        let lstm = LstmCell::new(input_size, hidden_size, device);
        let dropout = DropoutConfig::new(dropout_rate).init();
        let output_layer = LinearConfig::new(hidden_size, output_size).init(device);

        Self {
            input_size,
            hidden_size,
            output_size,
            lstm,
            dropout,
            output_layer,
        }
    }

    /// Forward pass through the model
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor of shape [batch_size, sequence_length, input_size]
    /// * `is_training` - Whether dropout is active
    ///
    /// # Returns
    ///
    /// Returns the output tensor of shape [batch_size, output_size]
    pub fn forward(&self, x: Tensor<B, 3>, is_training: bool) -> Tensor<B, 2> {
        let last_hidden = self.lstm.forward(x);

        let dropped = if is_training {
            self.dropout.forward(last_hidden)
        } else {
            last_hidden
        };

        self.output_layer.forward(dropped)
    }

    /// Inference pass with dropout disabled
    pub fn predict(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        self.forward(x, false)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }
}

/// Configuration for the ForecastLstm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastLstmConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub dropout_rate: f64,
}

impl ForecastLstmConfig {
    /// Default architecture for `input_size` predictor columns
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size,
            hidden_size: LSTM_HIDDEN_SIZE,
            output_size: OUTPUT_SIZE,
            dropout_rate: DROPOUT_RATE,
        }
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_dropout_rate(mut self, dropout_rate: f64) -> Self {
        self.dropout_rate = dropout_rate;
        self
    }

    /// Initialize a model from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> ForecastLstm<B> {
        ForecastLstm::new(
            self.input_size,
            self.hidden_size,
            self.output_size,
            self.dropout_rate,
            device,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_default_architecture() {
        let config = ForecastLstmConfig::new(18);
        assert_eq!(config.hidden_size, 50);
        assert_eq!(config.output_size, 1);
        assert!((config.dropout_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_model_creation() {
        let device = NdArrayDevice::default();
        let model: ForecastLstm<NdArray> = ForecastLstmConfig::new(18).init(&device);

        assert_eq!(model.input_size(), 18);
        assert_eq!(model.hidden_size(), 50);
        // Output layer weight is [in_features, out_features]
        assert_eq!(model.output_layer.weight.dims(), [50, 1]);
    }

    #[test]
    fn test_model_forward_shape() {
        let device = NdArrayDevice::default();
        let model: ForecastLstm<NdArray> =
            ForecastLstmConfig::new(6).with_hidden_size(16).init(&device);

        let input = Tensor::<NdArray, 3>::ones([5, 1, 6], &device);
        assert_eq!(model.forward(input.clone(), true).dims(), [5, 1]);
        assert_eq!(model.predict(input).dims(), [5, 1]);
    }

    #[test]
    fn test_prediction_is_deterministic_without_dropout() {
        let device = NdArrayDevice::default();
        let model: ForecastLstm<NdArray> =
            ForecastLstmConfig::new(3).with_dropout_rate(0.5).init(&device);

        let input = Tensor::<NdArray, 3>::ones([2, 1, 3], &device);
        let first = model.predict(input.clone()).into_data().to_vec::<f32>().unwrap();
        let second = model.predict(input).into_data().to_vec::<f32>().unwrap();
        assert_eq!(first, second);
    }
}
