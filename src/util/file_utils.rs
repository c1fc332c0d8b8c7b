// External crates
use chrono::NaiveDate;
use log::{debug, info};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

// Internal modules
use crate::config::DatasetConfig;
use crate::dataset::MonthlyDataset;
use crate::error::{ForecastError, Result};

/// Read a CSV or Parquet file into a DataFrame, picking the reader by extension
///
/// # Arguments
///
/// * `file_path` - Path to a `.csv` or `.parquet` file
///
/// # Returns
///
/// Returns the raw DataFrame
pub fn read_table<P: AsRef<Path>>(file_path: P) -> Result<DataFrame> {
    let path = file_path.as_ref();
    info!("Loading data from: {}", path.display());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let df = match extension.as_str() {
        "csv" | "txt" => CsvReader::new(File::open(path)?).finish()?,
        "parquet" | "pq" => ParquetReader::new(File::open(path)?).finish()?,
        other => return Err(ForecastError::UnsupportedFormat(other.to_string())),
    };

    debug!("Loaded {} rows with columns {:?}", df.height(), df.get_column_names());
    Ok(df)
}

/// Load and clean the dataset described by `config`
pub fn load_dataset(config: &DatasetConfig) -> Result<MonthlyDataset> {
    let df = read_table(&config.path)?;
    dataframe_to_dataset(&df, config)
}

/// Turn a raw DataFrame into a month-indexed dataset
///
/// The date column (or the first column when `config.date_column` is absent)
/// becomes the row index, `config.drop_columns` are removed, rows with any
/// missing value are dropped and every remaining column is cast to `f64`.
pub fn dataframe_to_dataset(df: &DataFrame, config: &DatasetConfig) -> Result<MonthlyDataset> {
    let all_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();

    let index_column = if all_columns.contains(&config.date_column) {
        config.date_column.clone()
    } else {
        all_columns
            .first()
            .cloned()
            .ok_or(ForecastError::EmptyDataset)?
    };

    for dropped in &config.drop_columns {
        if dropped != &index_column && !all_columns.contains(dropped) {
            return Err(ForecastError::MissingColumn(dropped.clone()));
        }
    }

    let feature_columns: Vec<String> = all_columns
        .iter()
        .filter(|c| **c != index_column && !config.drop_columns.contains(*c))
        .cloned()
        .collect();
    if !feature_columns.contains(&config.target) {
        return Err(ForecastError::MissingColumn(config.target.clone()));
    }

    let mut selected = vec![index_column.clone()];
    selected.extend(feature_columns.iter().cloned());
    let cleaned = df.select(selected)?.drop_nulls::<String>(None)?;
    if cleaned.height() == 0 {
        return Err(ForecastError::EmptyDataset);
    }
    if cleaned.height() < df.height() {
        info!(
            "Dropped {} rows with missing values",
            df.height() - cleaned.height()
        );
    }

    let dates = parse_date_column(cleaned.column(&index_column)?)?;

    let mut values = Array2::<f64>::zeros((cleaned.height(), feature_columns.len()));
    for (j, name) in feature_columns.iter().enumerate() {
        let column = cleaned.column(name)?.strict_cast(&DataType::Float64)?;
        for (i, value) in column.f64()?.into_iter().enumerate() {
            values[[i, j]] = value.ok_or_else(|| {
                ForecastError::InputShape(format!("missing value in column '{}'", name))
            })?;
        }
    }

    MonthlyDataset::new(dates, feature_columns, values, &config.target)
}

fn parse_date_column(column: &Column) -> Result<Vec<NaiveDate>> {
    let as_text = column.cast(&DataType::String)?;
    as_text
        .str()?
        .into_iter()
        .map(|raw| {
            let raw = raw.ok_or_else(|| ForecastError::InvalidDate("<null>".into()))?;
            parse_month(raw)
        })
        .collect()
}

/// Parse the date formats monthly spreadsheets commonly carry
pub fn parse_month(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    // Datetime values keep only their date part
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Ok(date);
        }
    }
    // Year-month values are pinned to the first of the month
    for (format, separator) in [("%Y-%m-%d", '-'), ("%Y/%m/%d", '/')] {
        let with_day = format!("{}{}01", date_part, separator);
        if let Ok(date) = NaiveDate::parse_from_str(&with_day, format) {
            return Ok(date);
        }
    }

    Err(ForecastError::InvalidDate(raw.to_string()))
}

/// Write a DataFrame as CSV, creating parent directories as needed
pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, file_path: P) -> Result<()> {
    let path = file_path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
