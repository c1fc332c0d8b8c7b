// External crates
use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Axis};

// Internal modules
use crate::error::{ForecastError, Result};

/// A month-indexed numeric table with the target stored in column 0.
///
/// Rows are sorted by month and every month appears once. The table is never
/// mutated once built; each forecast origin reads it through shared references.
#[derive(Debug, Clone)]
pub struct MonthlyDataset {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl MonthlyDataset {
    /// Build a dataset from raw parts
    ///
    /// # Arguments
    ///
    /// * `dates` - One date per row, any order
    /// * `columns` - Column names matching the width of `values`
    /// * `values` - Matrix of shape [rows, columns]
    /// * `target` - Name of the column to forecast
    ///
    /// # Returns
    ///
    /// Returns the dataset sorted by month with `target` moved to column 0
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Array2<f64>,
        target: &str,
    ) -> Result<Self> {
        if values.nrows() == 0 {
            return Err(ForecastError::EmptyDataset);
        }
        if dates.len() != values.nrows() || columns.len() != values.ncols() {
            return Err(ForecastError::InputShape(format!(
                "{} dates and {} column names for a {}x{} matrix",
                dates.len(),
                columns.len(),
                values.nrows(),
                values.ncols()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InputShape(
                "dataset contains non-finite values".into(),
            ));
        }

        let target_idx = columns
            .iter()
            .position(|c| c == target)
            .ok_or_else(|| ForecastError::MissingColumn(target.to_string()))?;

        let mut column_order = vec![target_idx];
        column_order.extend((0..columns.len()).filter(|&j| j != target_idx));

        let mut row_order: Vec<usize> = (0..dates.len()).collect();
        row_order.sort_by_key(|&i| dates[i]);

        let sorted_dates: Vec<NaiveDate> = row_order.iter().map(|&i| dates[i]).collect();
        for pair in sorted_dates.windows(2) {
            if same_month(pair[0], pair[1]) {
                return Err(ForecastError::DuplicateDate(pair[1]));
            }
        }

        let values = values
            .select(Axis(0), &row_order)
            .select(Axis(1), &column_order);
        let columns = column_order.iter().map(|&j| columns[j].clone()).collect();

        Ok(Self {
            dates: sorted_dates,
            columns,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names, target first
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn target(&self) -> &str {
        &self.columns[0]
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of columns other than the target
    pub fn n_features(&self) -> usize {
        self.columns.len() - 1
    }

    /// First and last month of the index
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// Row position of the month containing `date`
    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| same_month(*d, date))
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
