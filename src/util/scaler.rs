// External crates
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

// Internal modules
use crate::error::{ForecastError, Result};

/// Per-column min-max transform into a feature range.
///
/// The fitted `data_min` and `data_max` are kept so that normalized model
/// outputs can be mapped back into real units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit a scaler mapping every column of `data` into `[0, 1]`
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        Self::fit_with_range(data, (0.0, 1.0))
    }

    /// Fit a scaler mapping every column of `data` into `feature_range`
    ///
    /// # Arguments
    ///
    /// * `data` - Matrix of shape [rows, columns]
    /// * `feature_range` - Target `(low, high)` interval, `low < high`
    ///
    /// # Returns
    ///
    /// Returns the fitted scaler
    pub fn fit_with_range(data: &Array2<f64>, feature_range: (f64, f64)) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(ForecastError::InputShape(
                "cannot fit a scaler on an empty matrix".into(),
            ));
        }
        if feature_range.0 >= feature_range.1 {
            return Err(ForecastError::InputShape(format!(
                "invalid feature range ({}, {})",
                feature_range.0, feature_range.1
            )));
        }

        let mut data_min = Vec::with_capacity(data.ncols());
        let mut data_max = Vec::with_capacity(data.ncols());
        for column in data.axis_iter(Axis(1)) {
            let (min, max) = column_bounds(column)?;
            data_min.push(min);
            data_max.push(max);
        }

        Ok(Self {
            feature_range,
            data_min,
            data_max,
        })
    }

    pub fn n_features(&self) -> usize {
        self.data_min.len()
    }

    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    /// Fit on `data` and return the scaled copy alongside the scaler
    pub fn fit_transform(data: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    /// Map `data` into the feature range column by column
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;
        let (low, high) = self.feature_range;
        let mut scaled = data.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let range = self.range(j);
            column.mapv_inplace(|v| (v - self.data_min[j]) / range * (high - low) + low);
        }
        Ok(scaled)
    }

    /// Map scaled rows back into the original units
    pub fn inverse_transform(&self, scaled: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(scaled.ncols())?;
        let (low, high) = self.feature_range;
        let mut restored = scaled.clone();
        for (j, mut column) in restored.axis_iter_mut(Axis(1)).enumerate() {
            let range = self.range(j);
            column.mapv_inplace(|v| (v - low) / (high - low) * range + self.data_min[j]);
        }
        Ok(restored)
    }

    // A constant column gets a unit range, so it scales to `low` and inverts exactly
    fn range(&self, column: usize) -> f64 {
        let range = self.data_max[column] - self.data_min[column];
        if range.abs() < f64::EPSILON {
            1.0
        } else {
            range
        }
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.n_features() {
            return Err(ForecastError::InputShape(format!(
                "scaler was fitted on {} columns but received {}",
                self.n_features(),
                width
            )));
        }
        Ok(())
    }
}

fn column_bounds(column: ArrayView1<f64>) -> Result<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in column.iter() {
        if !v.is_finite() {
            return Err(ForecastError::InputShape(
                "cannot fit a scaler on non-finite values".into(),
            ));
        }
        min = min.min(v);
        max = max.max(v);
    }
    Ok((min, max))
}
