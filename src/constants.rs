// Dataset defaults
pub const DEFAULT_DATE_COLUMN: &str = "Date";
pub const DEFAULT_DROP_COLUMNS: [&str; 1] = ["Date"];

// Model parameters
pub const LSTM_HIDDEN_SIZE: usize = 50; // Width of the recurrent layer
pub const DROPOUT_RATE: f64 = 0.1;
pub const OUTPUT_SIZE: usize = 1; // One label per windowed row

// Training parameters
pub const EPOCHS: usize = 25;
pub const BATCH_SIZE: usize = 72;
pub const LEARNING_RATE: f64 = 0.001;
pub const ADAM_EPSILON: f32 = 1e-7;

// Keeps the gradient of sqrt finite when a prediction hits its target exactly
pub const LOSS_EPSILON: f64 = 1e-12;

// Reporting
pub const RMSE_DECIMALS: i32 = 2;
pub const PREDICTION_SUFFIX: &str = "_pred";
