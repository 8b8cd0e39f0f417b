//! CLI entry point for the bike-share ridership analysis tool.
//!
//! Provides subcommands for decomposing the ridership series, binning
//! ridership against weather covariates, correlating the numeric columns,
//! and running the whole report in one go.

use anyhow::{Result, bail};
use bikeshare_eda::analyzers::correlation::correlation_matrix;
use bikeshare_eda::analyzers::decompose::decompose;
use bikeshare_eda::analyzers::pipeline::{CovariateOutcome, aggregate_covariates, run};
use bikeshare_eda::analyzers::types::DecompositionModel;
use bikeshare_eda::config::AnalysisConfig;
use bikeshare_eda::dataset::Field;
use bikeshare_eda::loader::load_dataset;
use bikeshare_eda::output::{
    print_pretty, write_aggregation, write_correlation, write_decomposition, write_json,
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_eda")]
#[command(about = "Exploratory analysis of hourly bike-share ridership", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every analysis subcommand. Flags override the config file.
#[derive(Args)]
struct AnalysisArgs {
    /// JSON config file with period, bin count, model and covariates
    #[arg(long)]
    config: Option<String>,

    /// Samples per seasonal cycle
    #[arg(short, long)]
    period: Option<usize>,

    /// Number of equal-width covariate bins
    #[arg(short, long)]
    bins: Option<usize>,

    /// Decomposition model
    #[arg(short, long, value_enum)]
    model: Option<DecompositionModel>,
}

impl AnalysisArgs {
    fn resolve(&self) -> Result<AnalysisConfig> {
        let config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        }
        .with_overrides(self.period, self.bins, self.model);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose the ridership series into trend, seasonal and residual parts
    Decompose {
        /// Path to the ridership CSV (optionally .gz)
        #[arg(value_name = "FILE")]
        source: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// CSV file to write the components to
        #[arg(short, long, default_value = "decomposition.csv")]
        output: PathBuf,
    },
    /// Bin ridership against weather covariates and average each bin
    Aggregate {
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Covariate column to bin (repeatable); defaults to the configured list
        #[arg(short = 'c', long = "covariate", value_enum)]
        covariates: Vec<Field>,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Directory to write one CSV per covariate into
        #[arg(short = 'd', long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Compute the correlation matrix of ridership and weather columns
    Correlate {
        #[arg(value_name = "FILE")]
        source: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        #[arg(short, long, default_value = "correlation.csv")]
        output: PathBuf,
    },
    /// Run every analysis and write all tables plus a JSON summary
    Report {
        #[arg(value_name = "FILE")]
        source: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        #[arg(short = 'd', long, default_value = "output")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_eda.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_eda.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decompose {
            source,
            analysis,
            output,
        } => {
            let config = analysis.resolve()?;
            let dataset = load_dataset(&source)?;
            let result = decompose(&dataset.series(config.target), config.period, config.model)?;

            write_decomposition(&output, &result)?;
            info!(output = %output.display(), period = config.period, "Decomposition written");
        }
        Commands::Aggregate {
            source,
            covariates,
            analysis,
            output_dir,
        } => {
            let mut config = analysis.resolve()?;
            if !covariates.is_empty() {
                config = config.with_covariates(&covariates);
                config.validate()?;
            }
            let dataset = load_dataset(&source)?;
            let outcomes =
                aggregate_covariates(&dataset, config.target, &config.covariates, config.bin_count);

            let failed = write_outcomes(&output_dir, &outcomes)?;
            if failed > 0 {
                bail!("{failed} of {} covariate aggregations failed", outcomes.len());
            }
        }
        Commands::Correlate {
            source,
            analysis,
            output,
        } => {
            let config = analysis.resolve()?;
            let dataset = load_dataset(&source)?;
            let matrix = correlation_matrix(&dataset, &config.correlation_fields());
            print_pretty(&matrix);

            write_correlation(&output, &matrix)?;
            info!(output = %output.display(), "Correlation matrix written");
        }
        Commands::Report {
            source,
            analysis,
            output_dir,
        } => {
            let config = analysis.resolve()?;
            let dataset = load_dataset(&source)?;
            let report = run(&dataset, &config);

            if let Ok(d) = &report.decomposition {
                write_decomposition(&output_dir.join("decomposition.csv"), d)?;
            }
            let failed = write_outcomes(&output_dir, &report.aggregations)?;
            write_correlation(&output_dir.join("correlation.csv"), &report.correlation)?;
            write_json(&output_dir.join("summary.json"), &report.summary())?;

            info!(
                output_dir = %output_dir.display(),
                rows = report.rows,
                failed_covariates = failed,
                "Report written"
            );

            if let Err(e) = &report.decomposition {
                bail!("decomposition failed: {e}");
            }
        }
    }

    Ok(())
}

/// Writes `bins_<column>.csv` for every successful outcome and returns the
/// number of failed ones.
fn write_outcomes(output_dir: &Path, outcomes: &[CovariateOutcome]) -> Result<usize> {
    let mut failed = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(result) => {
                let path = output_dir.join(format!("bins_{}.csv", outcome.spec.field));
                write_aggregation(&path, result)?;
                if result.bins.iter().any(|b| b.mean.is_none()) {
                    warn!(covariate = %outcome.spec.field, "Some bins have no observations");
                }
                info!(
                    covariate = %outcome.spec.field,
                    title = %outcome.spec.title,
                    path = %path.display(),
                    "Aggregation written"
                );
            }
            Err(e) => {
                error!(covariate = %outcome.spec.field, error = %e, "Skipping covariate");
                failed += 1;
            }
        }
    }
    Ok(failed)
}
