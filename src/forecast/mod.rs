pub mod step_1_supervised_frame;
pub mod step_2_lstm_cell;
pub mod step_3_lstm_model_arch;
pub mod step_4_train_model;
pub mod step_5_prediction;
pub mod step_6_rolling_forecast;
