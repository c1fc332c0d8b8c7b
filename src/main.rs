// External crates
use anyhow::{anyhow, bail, Context, Result};
use burn_autodiff::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

// Local crate
use rolling_lstm::built_info;
use rolling_lstm::util::file_utils::{load_dataset, parse_month, write_csv};
use rolling_lstm::util::model_logger::{create_experiment_dir, ForecastExperiment};
use rolling_lstm::{
    DatasetConfig, ForecastOrigin, ForecastReport, RollingForecaster, RunConfig, TrainingConfig,
};

type TrainingBackend = Autodiff<NdArray<f32>>;

#[derive(Parser)]
#[command(name = "rolling-lstm")]
#[command(about = "Rolling-origin monthly forecasting with one LSTM per origin", long_about = None)]
struct Cli {
    /// JSON run configuration; explicit flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input table (CSV or Parquet)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Column to forecast
    #[arg(short, long)]
    target: Option<String>,

    /// Column to drop before training (repeatable)
    #[arg(long = "drop")]
    drop_columns: Vec<String>,

    /// Column holding the month of each row
    #[arg(long)]
    date_column: Option<String>,

    /// Forecast origin as DATE:LAG:LEAD, e.g. 2020-06-01:6:1 (repeatable)
    #[arg(short, long = "origin", value_parser = parse_origin)]
    origins: Vec<ForecastOrigin>,

    /// Leave the target's own history out of the predictors
    #[arg(long)]
    exclude_target: bool,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    hidden_size: Option<usize>,

    #[arg(long)]
    dropout: Option<f64>,

    #[arg(long)]
    learning_rate: Option<f64>,

    /// Seed for weight initialisation and batch order
    #[arg(long)]
    seed: Option<u64>,

    /// Train origins concurrently
    #[arg(long)]
    parallel: bool,

    /// Write the forecast table to this CSV file
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,

    /// Write a JSON experiment record under this directory
    #[arg(long)]
    experiment_dir: Option<PathBuf>,
}

/// Parse `DATE:LAG:LEAD`, splitting from the right so the date may hold colons
fn parse_origin(raw: &str) -> std::result::Result<ForecastOrigin, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(lead), Some(lag), Some(date)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected DATE:LAG:LEAD, got '{}'", raw));
    };

    let date = parse_month(date).map_err(|e| e.to_string())?;
    let lag = lag
        .trim()
        .parse()
        .map_err(|_| format!("invalid lag '{}'", lag))?;
    let lead = lead
        .trim()
        .parse()
        .map_err(|_| format!("invalid lead '{}'", lead))?;
    Ok(ForecastOrigin::new(date, lag, lead))
}

impl Cli {
    /// Merge the optional config file with the command-line flags
    fn into_run_config(self) -> Result<(RunConfig, Option<PathBuf>, Option<PathBuf>)> {
        let mut run = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("cannot read run configuration {}", path.display()))?,
            None => {
                let data = self
                    .data
                    .clone()
                    .ok_or_else(|| anyhow!("either --config or --data is required"))?;
                let target = self
                    .target
                    .clone()
                    .ok_or_else(|| anyhow!("--target is required without --config"))?;
                RunConfig {
                    dataset: DatasetConfig::new(data, target),
                    origins: Vec::new(),
                    use_target: true,
                    training: TrainingConfig::default(),
                    parallel: false,
                }
            }
        };

        if let Some(data) = self.data {
            run.dataset.path = data;
        }
        if let Some(target) = self.target {
            run.dataset.target = target;
        }
        if !self.drop_columns.is_empty() {
            run.dataset.drop_columns = self.drop_columns;
        }
        if let Some(date_column) = self.date_column {
            run.dataset.date_column = date_column;
        }
        if !self.origins.is_empty() {
            run.origins = self.origins;
        }
        if self.exclude_target {
            run.use_target = false;
        }
        if self.parallel {
            run.parallel = true;
        }

        let training = &mut run.training;
        if let Some(epochs) = self.epochs {
            training.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            training.batch_size = batch_size;
        }
        if let Some(hidden_size) = self.hidden_size {
            training.hidden_size = hidden_size;
        }
        if let Some(dropout) = self.dropout {
            training.dropout = dropout;
        }
        if let Some(learning_rate) = self.learning_rate {
            training.learning_rate = learning_rate;
        }
        if self.seed.is_some() {
            training.seed = self.seed;
        }

        if run.origins.is_empty() {
            bail!("no forecast origins given; pass --origin DATE:LAG:LEAD or list them in --config");
        }
        Ok((run, self.output, self.experiment_dir))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let (run, output, experiment_dir) = Cli::parse().into_run_config()?;

    println!(
        "{} {} ({} profile, {})",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::PROFILE,
        built_info::TARGET
    );

    let dataset = load_dataset(&run.dataset)
        .with_context(|| format!("cannot load {}", run.dataset.path.display()))?;
    if let Some((first, last)) = dataset.date_range() {
        println!(
            "Loaded {} months of '{}' with {} other variables ({} to {})",
            dataset.len(),
            dataset.target(),
            dataset.n_features(),
            first,
            last
        );
    }
    if !run.use_target {
        info!("Target history excluded from the predictors");
    }

    let device = NdArrayDevice::default();
    let forecaster = RollingForecaster::<TrainingBackend>::new(dataset, run.training.clone(), device)?
        .with_parallel(run.parallel);

    let started = Instant::now();
    let report = forecaster.run_origins(&run.origins, run.use_target)?;
    let elapsed = started.elapsed().as_secs_f64();

    for record in report.records() {
        println!(
            "{}  lag {:>2}  lead {:>2}  predicted {:>12.3}  actual {:>12.3}",
            record.date, record.lag, record.lead, record.predicted, record.actual
        );
    }
    println!("{}", report.summary_line());
    println!("RMSE (2 dp): {:.2}", report.rmse());

    if let Some(path) = output {
        let mut table = report.to_dataframe()?;
        write_csv(&mut table, &path)
            .with_context(|| format!("cannot write results to {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    if let Some(root) = experiment_dir {
        let path = save_experiment(&root, &run, &report, elapsed)?;
        println!("Experiment saved to {}", path.display());
    }

    Ok(())
}

/// Write the run's experiment record into a fresh directory under `root`
fn save_experiment(
    root: &Path,
    run: &RunConfig,
    report: &ForecastReport,
    elapsed: f64,
) -> Result<PathBuf> {
    let dir = create_experiment_dir(root)
        .with_context(|| format!("cannot create experiment directory under {}", root.display()))?;
    let mut experiment = ForecastExperiment::new(
        &run.dataset.path,
        report.target(),
        run.use_target,
        &run.training,
    );
    experiment.set_report(report);
    experiment.set_training_time(elapsed);
    if run.parallel {
        experiment.add_note("origins trained in parallel");
    }
    experiment.save(&dir).context("cannot save experiment record")
}
