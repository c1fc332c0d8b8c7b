#[cfg(test)]
mod tests {
    use crate::config::DatasetConfig;
    use crate::error::ForecastError;
    use crate::util::file_utils::{
        dataframe_to_dataset, load_dataset, parse_month, read_table, write_csv,
    };
    use crate::util::test_utils::{generate_monthly_dataframe, TARGET};
    use chrono::NaiveDate;
    use polars::prelude::*;
    use std::fs;

    #[test]
    fn test_parse_month_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
        for raw in [
            "2019-06-01",
            "2019/06/01",
            "06/01/2019",
            "01.06.2019",
            "2019-06",
            "2019/06",
            "2019-06-01 00:00:00",
            "2019-06-01T00:00:00",
            " 2019-06-01 ",
        ] {
            assert_eq!(parse_month(raw).unwrap(), expected, "failed on {:?}", raw);
        }
        assert!(matches!(parse_month("June 2019"), Err(ForecastError::InvalidDate(_))));
    }

    #[test]
    fn test_dataframe_to_dataset_moves_target_first() {
        let df = generate_monthly_dataframe(24);
        let config = DatasetConfig::new("unused.csv", TARGET);

        let dataset = dataframe_to_dataset(&df, &config).unwrap();

        assert_eq!(dataset.len(), 24);
        assert_eq!(dataset.target(), TARGET);
        assert_eq!(dataset.columns().len(), 3);
        assert!(!dataset.columns().contains(&"Date".to_string()));
        assert_eq!(
            dataset.dates()[0],
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let df = df!(
            "Date" => ["2020-01-01", "2020-02-01", "2020-03-01", "2020-04-01"],
            "y" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "x" => [Some(10.0), Some(20.0), Some(30.0), None]
        )
        .unwrap();

        let dataset = dataframe_to_dataset(&df, &DatasetConfig::new("unused.csv", "y")).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.values().column(0).to_vec(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_dropped_columns_do_not_cost_rows() {
        let df = df!(
            "Date" => ["2020-01", "2020-02", "2020-03"],
            "y" => [1.0, 2.0, 3.0],
            "notes" => [None, Some("revised"), None]
        )
        .unwrap();
        let config = DatasetConfig::new("unused.csv", "y")
            .with_drop_columns(vec!["Date".to_string(), "notes".to_string()]);

        let dataset = dataframe_to_dataset(&df, &config).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.columns(), &["y".to_string()]);
    }

    #[test]
    fn test_first_column_is_index_without_date_column() {
        let df = df!(
            "month" => ["2021-03-01", "2021-01-01", "2021-02-01"],
            "y" => [3.0, 1.0, 2.0]
        )
        .unwrap();
        let config = DatasetConfig::new("unused.csv", "y").with_drop_columns(vec![]);

        let dataset = dataframe_to_dataset(&df, &config).unwrap();
        assert_eq!(dataset.values().column(0).to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unknown_columns_are_reported() {
        let df = generate_monthly_dataframe(6);

        let missing_target = dataframe_to_dataset(&df, &DatasetConfig::new("unused.csv", "profit"));
        assert!(matches!(missing_target, Err(ForecastError::MissingColumn(c)) if c == "profit"));

        let config = DatasetConfig::new("unused.csv", TARGET)
            .with_drop_columns(vec!["Date".to_string(), "region".to_string()]);
        assert!(matches!(
            dataframe_to_dataset(&df, &config),
            Err(ForecastError::MissingColumn(c)) if c == "region"
        ));
    }

    #[test]
    fn test_csv_and_parquet_load_identically() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = generate_monthly_dataframe(30);

        let csv_path = dir.path().join("monthly.csv");
        write_csv(&mut df, &csv_path).unwrap();

        let parquet_path = dir.path().join("monthly.parquet");
        let mut file = fs::File::create(&parquet_path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();

        let from_csv = load_dataset(&DatasetConfig::new(&csv_path, TARGET)).unwrap();
        let from_parquet = load_dataset(&DatasetConfig::new(&parquet_path, TARGET)).unwrap();

        assert_eq!(from_csv.dates(), from_parquet.dates());
        assert_eq!(from_csv.columns(), from_parquet.columns());
        for (a, b) in from_csv.values().iter().zip(from_parquet.values().iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monthly.xlsx");
        fs::write(&path, b"not a table").unwrap();

        assert!(matches!(
            read_table(&path),
            Err(ForecastError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = read_table("does_not_exist.csv");
        assert!(matches!(result, Err(ForecastError::Io(_))));
    }
}
