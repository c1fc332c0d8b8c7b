// External imports
use chrono::{Months, NaiveDate};
use ndarray::Array2;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Internal imports
use crate::dataset::MonthlyDataset;

pub const TARGET: &str = "sales";
pub const FEATURES: [&str; 2] = ["price", "temperature"];

/// First-of-month dates starting January 2015
pub fn month_sequence(num_months: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    (0..num_months)
        .map(|i| start + Months::new(i as u32))
        .collect()
}

/// Seasonal monthly series: a trending target and two related features
pub fn generate_monthly_values(num_months: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Array2::<f64>::zeros((num_months, 3));
    for t in 0..num_months {
        let season = (t as f64 * std::f64::consts::PI / 6.0).sin();
        let price = 20.0 + 0.1 * t as f64 + rng.random::<f64>();
        let temperature = 15.0 + 10.0 * season + rng.random::<f64>();
        values[[t, 0]] = 500.0 + 4.0 * t as f64 + 30.0 * season - 2.0 * price + rng.random::<f64>() * 5.0;
        values[[t, 1]] = price;
        values[[t, 2]] = temperature;
    }
    values
}

/// Monthly dataset with `sales` as target
pub fn generate_monthly_dataset(num_months: usize) -> MonthlyDataset {
    let columns = std::iter::once(TARGET)
        .chain(FEATURES)
        .map(String::from)
        .collect();
    MonthlyDataset::new(
        month_sequence(num_months),
        columns,
        generate_monthly_values(num_months, 7),
        TARGET,
    )
    .unwrap()
}

/// The same data as a raw frame with a `Date` column and the target last
pub fn generate_monthly_dataframe(num_months: usize) -> DataFrame {
    let values = generate_monthly_values(num_months, 7);
    let dates: Vec<String> = month_sequence(num_months)
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    DataFrame::new(vec![
        Column::new("Date".into(), dates),
        Column::new(FEATURES[0].into(), values.column(1).to_vec()),
        Column::new(FEATURES[1].into(), values.column(2).to_vec()),
        Column::new(TARGET.into(), values.column(0).to_vec()),
    ])
    .unwrap()
}
