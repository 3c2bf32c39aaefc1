//! Cohort CLI binary.
//!
//! Provides the command-line interface for coverage-filtered top-N sampling.

mod progress;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cohort::{ExpectedPeriods, Sampler, SamplerConfig};
use cohort_output::{ExportFormat, Exporter, RunSummary, selection_rows};
use cohort_stats::RankEstimator;
use progress::SpinnerProgress;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Cohort: coverage-filtered top-N sampling of entity panels", long_about = None)]
#[command(version)]
struct Cli {
    /// Log progress details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select entities and write all of their rows to a new file
    Sample {
        /// Input panel file
        #[arg(long, short)]
        input: PathBuf,

        /// Output file
        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the ranked selection here (.json for JSON, CSV otherwise)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the run summary here (.md, .json, CSV otherwise)
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Rank entities and print the selection without writing any rows
    Rank {
        /// Input panel file
        #[arg(long, short)]
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of entities to select
    #[arg(long)]
    n_stocks: Option<usize>,

    /// Minimum fraction of expected periods an entity must cover
    #[arg(long)]
    min_coverage: Option<f64>,

    /// Rows per block
    #[arg(long)]
    block_size: Option<usize>,

    /// Expected periods per entity: a count, or "observed"
    #[arg(long)]
    expected_periods: Option<ExpectedPeriods>,

    /// Entity identifier column
    #[arg(long)]
    entity_column: Option<String>,

    /// Ranking attribute column
    #[arg(long)]
    rank_column: Option<String>,

    /// Period column
    #[arg(long)]
    period_column: Option<String>,

    /// Field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Rank value estimator
    #[arg(long, value_enum)]
    estimator: Option<EstimatorArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EstimatorArg {
    /// Mean over all of an entity's rows
    GlobalMean,
    /// Mean over the entity's rows in its first block
    FirstBlockMean,
}

impl From<EstimatorArg> for RankEstimator {
    fn from(arg: EstimatorArg) -> Self {
        match arg {
            EstimatorArg::GlobalMean => Self::GlobalMean,
            EstimatorArg::FirstBlockMean => Self::FirstBlockMean,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

impl SelectionArgs {
    /// Start from the configuration file, or the defaults, and apply flags.
    fn into_config(self) -> Result<SamplerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SamplerConfig::from_json_file(path)?,
            None => SamplerConfig::default(),
        };

        if let Some(n) = self.n_stocks {
            config.n_stocks = n;
        }
        if let Some(c) = self.min_coverage {
            config.min_data_coverage = c;
        }
        if let Some(b) = self.block_size {
            config.block_size = b;
        }
        if let Some(t) = self.expected_periods {
            config.expected_periods = t;
        }
        if let Some(column) = self.entity_column {
            config.columns.entity = column;
        }
        if let Some(column) = self.rank_column {
            config.columns.rank = column;
        }
        if let Some(column) = self.period_column {
            config.columns.period = Some(column);
        }
        if let Some(d) = self.delimiter {
            config.delimiter = d;
        }
        if let Some(e) = self.estimator {
            config.rank_estimator = e.into();
        }

        debug!(?config, "resolved configuration");
        Ok(config)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sample {
            input,
            output,
            selection,
            report,
            summary,
        } => {
            let config = selection.into_config()?;
            sample(&input, &output, config, report.as_deref(), summary.as_deref())?;
        }
        Commands::Rank {
            input,
            selection,
            format,
        } => {
            let config = selection.into_config()?;
            rank(&input, config, format)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn sample(
    input: &Path,
    output: &Path,
    config: SamplerConfig,
    report: Option<&Path>,
    summary: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sampler = Sampler::new(config)?;
    print_settings(&sampler);

    let mut progress = SpinnerProgress::new();
    let outcome = sampler.run(input, output, &mut progress)?;
    drop(progress);

    if let Some(path) = report {
        let rows = selection_rows(&outcome.selection);
        rows.export_to_file(path, ExportFormat::from_path(path))?;
        eprintln!("✓ selection written to {}", path.display());
    }
    if let Some(path) = summary {
        write_summary(&outcome.summary, path)?;
        eprintln!("✓ summary written to {}", path.display());
    }

    println!("{}", outcome.summary.to_ascii_table());
    println!("{}", outcome.summary);

    Ok(())
}

fn rank(
    input: &Path,
    config: SamplerConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let sampler = Sampler::new(config)?;

    let mut progress = SpinnerProgress::new();
    let ranking = sampler.rank(input, &mut progress)?;
    drop(progress);

    match format {
        OutputFormat::Text => {
            print!("{}", ranking.summary.to_ascii_table());
            println!();
            println!(
                "  {:>5}  {:<16}{:>8}{:>11}{:>20}",
                "Rank", "Entity", "Obs", "Coverage", "Rank Value"
            );
            println!("  {}", "-".repeat(60));
            for selected in ranking.selection.entities() {
                let value = selected
                    .stats
                    .rank_value
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
                println!(
                    "  {:>5}  {:<16}{:>8}{:>10.1}%{:>20}",
                    selected.rank,
                    selected.entity.as_str(),
                    selected.stats.observation_count,
                    selected.coverage * 100.0,
                    value
                );
            }
        }
        OutputFormat::Csv => {
            print!("{}", ranking.selection.export_to_string(ExportFormat::Csv)?);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                ranking.selection.export_to_string(ExportFormat::PrettyJson)?
            );
        }
    }

    Ok(())
}

fn print_settings(sampler: &Sampler) {
    let config = sampler.config();
    eprintln!("Sampling Settings");
    eprintln!("=================");
    eprintln!("  Entities:         {}", config.n_stocks);
    eprintln!(
        "  Min Coverage:     {:.1}%",
        config.min_data_coverage * 100.0
    );
    eprintln!("  Expected Periods: {}", config.expected_periods);
    eprintln!("  Block Size:       {}", config.block_size);
    eprintln!("  Rank Column:      {}", config.columns.rank);
    eprintln!("  Estimator:        {}", config.rank_estimator.name());
    eprintln!();
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    if is_markdown {
        std::fs::write(path, summary.to_markdown())?;
    } else {
        summary.export_to_file(path, ExportFormat::from_path(path))?;
    }
    Ok(())
}
