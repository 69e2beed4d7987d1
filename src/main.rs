//! CLI entry point for the BPL activity pipeline.
//!
//! Provides subcommands for fetching the dataset from the Analyze Boston
//! datastore, aggregating a stored dataset, and running both in sequence.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bpl_activity::analyzers::{BucketPolicy, analyze};
use bpl_activity::fetch::{
    BasicClient, DEFAULT_ENDPOINT, DEFAULT_RESOURCE_ID, FetchConfig, Fetcher, IngestSummary,
    RetryPolicy,
};
use bpl_activity::output::{DatasetWriter, write_json};
use bpl_activity::report::TracingReporter;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_DATASET: &str = "data/bpl_dataset.csv";
const DEFAULT_AGGREGATES: &str = "data/bpl_aggregates.json";

#[derive(Parser, Debug)]
#[command(name = "bpl_activity")]
#[command(about = "Fetch and aggregate Boston Public Library daily activity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download every page of the dataset into a CSV file
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV file to write the dataset to
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        output: PathBuf,
    },
    /// Aggregate a stored dataset into heatmap and daily-average tables
    Aggregate {
        /// CSV file written by `fetch`
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        input: PathBuf,

        /// JSON file to write the aggregates to
        #[arg(short, long, default_value = DEFAULT_AGGREGATES)]
        output: PathBuf,

        #[command(flatten)]
        buckets: BucketArgs,
    },
    /// Fetch the dataset, then aggregate it
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV file the dataset is fetched into and aggregated from
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        dataset: PathBuf,

        /// JSON file to write the aggregates to
        #[arg(short, long, default_value = DEFAULT_AGGREGATES)]
        output: PathBuf,

        #[command(flatten)]
        buckets: BucketArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// CKAN `datastore_search` endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Datastore resource to page through
    #[arg(long, default_value = DEFAULT_RESOURCE_ID)]
    resource_id: String,

    /// Records per page
    #[arg(long, default_value_t = 1000, value_parser = parse_limit)]
    limit: usize,

    /// Attempts per page before giving up
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    retries: u32,

    /// Exponential backoff base in seconds
    #[arg(long, default_value_t = 1.5, value_parser = parse_seconds)]
    backoff: f64,

    /// Upper bound of the random jitter added to each backoff, in seconds
    #[arg(long, default_value_t = 1.0, value_parser = parse_seconds)]
    jitter: f64,

    /// Pause between pages in milliseconds
    #[arg(long, default_value_t = 1000)]
    page_delay_ms: u64,
}

impl SourceArgs {
    fn config(&self) -> FetchConfig {
        FetchConfig {
            endpoint: self.endpoint.clone(),
            resource_id: self.resource_id.clone(),
            limit: self.limit,
            retry: RetryPolicy {
                max_attempts: self.retries,
                backoff_base: self.backoff,
                jitter: self.jitter,
            },
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Day is the record's weekday, weeks start on Monday
    Weekday,
    /// Day follows row order from --start-day
    Sequential,
}

#[derive(Args, Debug)]
struct BucketArgs {
    /// How rows are assigned to (week, day) cells
    #[arg(long, value_enum, default_value_t = PolicyArg::Weekday)]
    policy: PolicyArg,

    /// Day index of the first row under the sequential policy (0 = Mon)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=6))]
    start_day: u8,
}

impl BucketArgs {
    fn policy(&self) -> Result<BucketPolicy> {
        Ok(match self.policy {
            PolicyArg::Weekday => BucketPolicy::WeekdayAnchored,
            PolicyArg::Sequential => BucketPolicy::sequential(self.start_day)?,
        })
    }
}

fn parse_limit(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Finite, non-negative number of seconds.
fn parse_seconds(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        Ok(_) => Err("must be a finite number of seconds, zero or more".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command) {
        error!(error = %format!("{e:#}"), "Pipeline failed");
        return Err(e);
    }
    Ok(())
}

/// Colored stderr plus a JSON daily-rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bpl_activity.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bpl_activity.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

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
        .try_init()?;

    Ok(guard)
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Fetch { source, output } => {
            fetch(&source, &output)?;
        }
        Commands::Aggregate {
            input,
            output,
            buckets,
        } => {
            aggregate(&input, &output, buckets.policy()?)?;
        }
        Commands::Run {
            source,
            dataset,
            output,
            buckets,
        } => {
            let policy = buckets.policy()?;
            fetch(&source, &dataset)?;
            aggregate(&dataset, &output, policy)?;
        }
    }
    Ok(())
}

fn fetch(source: &SourceArgs, dataset: &Path) -> Result<IngestSummary> {
    let client = BasicClient::new().context("failed to build HTTP client")?;
    let fetcher = Fetcher::new(client, source.config());
    let mut writer = DatasetWriter::create(dataset)
        .with_context(|| format!("failed to create {}", dataset.display()))?;

    let summary = fetcher
        .run(&mut writer)
        .with_context(|| format!("fetch into {} aborted", dataset.display()))?;

    info!(
        pages = summary.pages,
        records = summary.records,
        requests = summary.requests,
        dataset = %dataset.display(),
        "Dataset written"
    );
    Ok(summary)
}

fn aggregate(dataset: &Path, output: &Path, policy: BucketPolicy) -> Result<()> {
    let aggregate = analyze(dataset, policy, TracingReporter)
        .with_context(|| format!("failed to aggregate {}", dataset.display()))?;

    write_json(output, &aggregate)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        window_start = %aggregate.window.start,
        window_end = %aggregate.window.end,
        "Aggregates written"
    );
    Ok(())
}
