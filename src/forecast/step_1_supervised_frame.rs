// External crates
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};

// Internal modules
use crate::error::{ForecastError, Result};

/// A time series reframed as (history window, future label) rows.
///
/// Column names follow the `var{j}(t-{i})` / `var{j}(t)` / `var{j}(t+{i})`
/// convention with 1-based variable numbers; `var1` is the target.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedFrame {
    columns: Vec<String>,
    values: Array2<f64>,
    source_rows: Vec<usize>,
}

impl SupervisedFrame {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Input row `t` each windowed row was built around
    pub fn source_rows(&self) -> &[usize] {
        &self.source_rows
    }

    /// Every column but the last
    pub fn predictors(&self) -> ArrayView2<'_, f64> {
        self.values.slice(s![.., ..self.width() - 1])
    }

    /// The last column
    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.values.column(self.width() - 1)
    }

    /// Rows `start..end` of the frame
    pub fn rows(&self, start: usize, end: usize) -> SupervisedFrame {
        SupervisedFrame {
            columns: self.columns.clone(),
            values: self.values.slice(s![start..end, ..]).to_owned(),
            source_rows: self.source_rows[start..end].to_vec(),
        }
    }
}

/// Reframe a scaled matrix into supervised-learning rows
///
/// # Arguments
///
/// * `data` - Matrix of shape [months, variables], target in column 0
/// * `lag` - Number of past months used as predictors
/// * `lead` - Number of future months carried per row, the last one holding the label
/// * `drop_incomplete` - Drop rows whose window runs off either end of the series
/// * `include_target` - Whether lagged blocks carry the target column
///
/// # Returns
///
/// Returns the lagged blocks (most distant first) followed by every variable
/// at months `t .. t+lead-1`. With `drop_incomplete` the frame holds
/// `months - lag - lead + 1` rows; otherwise every month is kept and cells
/// outside the series are `NaN`.
pub fn series_to_supervised(
    data: &Array2<f64>,
    lag: usize,
    lead: usize,
    drop_incomplete: bool,
    include_target: bool,
) -> Result<SupervisedFrame> {
    let n_rows = data.nrows();
    let n_vars = data.ncols();

    if lag == 0 || lead == 0 {
        return Err(ForecastError::InputShape(format!(
            "lag and lead must both be at least 1 (got lag {}, lead {})",
            lag, lead
        )));
    }
    if n_rows < lag + lead {
        return Err(ForecastError::InputShape(format!(
            "{} rows cannot hold a window of lag {} and lead {}",
            n_rows, lag, lead
        )));
    }
    if n_vars == 0 || (!include_target && n_vars < 2) {
        return Err(ForecastError::InputShape(format!(
            "{} variables leave no lagged predictors",
            n_vars
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::InputShape(
            "windowing input contains missing values".into(),
        ));
    }

    // Without the target the lagged range starts at the second variable
    let lagged_vars: Vec<usize> = if include_target {
        (0..n_vars).collect()
    } else {
        (1..n_vars).collect()
    };

    let mut columns = Vec::with_capacity(lag * lagged_vars.len() + lead * n_vars);
    for i in (1..=lag).rev() {
        for &j in &lagged_vars {
            columns.push(format!("var{}(t-{})", j + 1, i));
        }
    }
    for i in 0..lead {
        for j in 0..n_vars {
            if i == 0 {
                columns.push(format!("var{}(t)", j + 1));
            } else {
                columns.push(format!("var{}(t+{})", j + 1, i));
            }
        }
    }

    let source_rows: Vec<usize> = if drop_incomplete {
        (lag..=n_rows - lead).collect()
    } else {
        (0..n_rows).collect()
    };

    let width = columns.len();
    let mut buffer = Vec::with_capacity(source_rows.len() * width);
    for &t in &source_rows {
        for i in (1..=lag).rev() {
            for &j in &lagged_vars {
                buffer.push(if t >= i { data[[t - i, j]] } else { f64::NAN });
            }
        }
        for i in 0..lead {
            for j in 0..n_vars {
                buffer.push(if t + i < n_rows {
                    data[[t + i, j]]
                } else {
                    f64::NAN
                });
            }
        }
    }

    let values = Array2::from_shape_vec((source_rows.len(), width), buffer)?;
    Ok(SupervisedFrame {
        columns,
        values,
        source_rows,
    })
}

/// Reduce a reframed table to its predictors plus a single label column
///
/// Drops the non-target variables at the label month, then the intermediate
/// future blocks between the history window and the label. What remains is
/// the lagged history followed by `var1` at `t+lead-1`.
pub fn prune_to_label(frame: &SupervisedFrame, n_vars: usize, lead: usize) -> Result<SupervisedFrame> {
    let future_width = lead * n_vars;
    if n_vars == 0 || lead == 0 || frame.width() <= future_width {
        return Err(ForecastError::InputShape(format!(
            "a frame of {} columns has no history in front of {} future blocks of {} variables",
            frame.width(),
            lead,
            n_vars
        )));
    }

    let after_label_drop = frame.width() - (n_vars - 1);
    let label = after_label_drop - 1;
    let redundant_start = label - (lead - 1) * n_vars;

    let keep: Vec<usize> = (0..redundant_start).chain(std::iter::once(label)).collect();

    Ok(SupervisedFrame {
        columns: keep.iter().map(|&j| frame.columns[j].clone()).collect(),
        values: frame.values.select(Axis(1), &keep),
        source_rows: frame.source_rows.clone(),
    })
}

/// Reshape predictor rows into a single-timestep sequence tensor
///
/// # Returns
///
/// Returns a tensor of shape [rows, 1, columns]
pub fn predictors_to_tensor<B: Backend>(
    predictors: ArrayView2<f64>,
    device: &B::Device,
) -> Tensor<B, 3> {
    let (rows, width) = predictors.dim();
    let data: Vec<f32> = predictors.iter().map(|&v| v as f32).collect();
    Tensor::<B, 1>::from_data(data.as_slice(), device).reshape([rows, 1, width])
}

/// Labels as a column tensor of shape [rows, 1]
pub fn labels_to_tensor<B: Backend>(labels: ArrayView1<f64>, device: &B::Device) -> Tensor<B, 2> {
    let rows = labels.len();
    let data: Vec<f32> = labels.iter().map(|&v| v as f32).collect();
    Tensor::<B, 1>::from_data(data.as_slice(), device).reshape([rows, 1])
}
