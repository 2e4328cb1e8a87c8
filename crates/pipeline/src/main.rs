//! Lagpipe CLI
//!
//! End-to-end run over one time-ordered CSV: fit imputation, stream the data
//! through the chunked lag transform (optionally joined against a lookup
//! table), split by year, train the boosted forest on the early years, and
//! score the held-out remainder.

use anyhow::{Context, Result};
use clap::Parser;
use lagpipe_engine::{LagSpec, LagTransformEngine, PipelineDriver};
use lagpipe_model::{evaluate, DatasetEncoder, ForestConfig, ForestTrainer};
use lagpipe_pipeline::{
    read_table, CsvReadConfig, CsvSink, CsvSource, ImputingSource, Joiner, JoiningSource,
};
use lagpipe_pipeline::impute::ImputeAccumulator;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "lagpipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chunked lag-feature pipeline for tabular regression", long_about = None)]
struct Args {
    /// Time-ordered input CSV (headered)
    #[arg(short, long)]
    input: PathBuf,

    /// Optional lookup CSV to left-join onto the input
    #[arg(long)]
    lookup: Option<PathBuf>,

    /// Comma-separated join key columns (required with --lookup)
    #[arg(long)]
    join_keys: Option<String>,

    /// Column to derive lag features from
    #[arg(long, default_value = "cnt")]
    lag_column: String,

    /// Comma-separated positive lag offsets
    #[arg(long, default_value = "1")]
    lags: String,

    /// Rows per chunk; bounds memory for arbitrarily large inputs
    #[arg(long, default_value = "5000")]
    chunk_size: usize,

    /// Leading rows emitted as one schema-probe chunk (0 disables)
    #[arg(long, default_value = "10")]
    probe_rows: usize,

    /// Date column driving the train/test split
    #[arg(long, default_value = "dteday")]
    date_column: String,

    /// Rows with year < this train the model; the rest are scored
    #[arg(long)]
    split_year: i32,

    /// Comma-separated feature columns (lag columns are added automatically)
    #[arg(long)]
    features: String,

    /// Regression target column
    #[arg(long, default_value = "cnt")]
    target: String,

    /// Number of boosting trees
    #[arg(long, default_value = "64")]
    trees: usize,

    /// Maximum tree depth (clamped to 15)
    #[arg(long, default_value = "6")]
    max_depth: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "8")]
    min_samples_leaf: usize,

    /// Boosting learning rate
    #[arg(long, default_value = "0.1")]
    learning_rate: f64,

    /// Output directory for transformed data, model, and metrics
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("lagpipe v{}", env!("CARGO_PKG_VERSION"));

    let offsets: Vec<usize> = parse_list(&args.lags)
        .iter()
        .map(|s| s.parse::<usize>().with_context(|| format!("bad lag offset '{s}'")))
        .collect::<Result<_>>()?;
    let spec = LagSpec::new(args.lag_column.clone(), offsets)
        .context("invalid lag configuration")?;

    std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    // Optional join preparation.
    let joiner = match (&args.lookup, &args.join_keys) {
        (Some(path), Some(keys)) => {
            info!("Loading lookup table: {}", path.display());
            let lookup = read_table(path)?;
            Some(Joiner::build(&lookup, &parse_list(keys)).context("Failed to prepare join")?)
        }
        (Some(_), None) => anyhow::bail!("--lookup requires --join-keys"),
        _ => None,
    };

    // Pass 1: fit imputation over the joined stream, so holes the join
    // introduces (unmatched keys, missing lookup cells) get fills too.
    info!("Fitting imputation over: {}", args.input.display());
    let fit_raw = CsvSource::open(
        &args.input,
        CsvReadConfig {
            chunk_size: args.chunk_size,
            probe_rows: 0,
        },
    )
    .context("Failed to open input for imputation fit")?;
    let plan = match &joiner {
        Some(joiner) => ImputeAccumulator::fit_source(JoiningSource::new(fit_raw, joiner.clone())),
        None => ImputeAccumulator::fit_source(fit_raw),
    }
    .context("Failed to fit imputation plan")?;

    // Pass 2: stream through (join) → impute → lag transform → CSV sink.
    info!(
        "Transforming with offsets {:?} on column '{}'",
        spec.offsets(),
        spec.source_column()
    );
    let raw = CsvSource::open(
        &args.input,
        CsvReadConfig {
            chunk_size: args.chunk_size,
            probe_rows: args.probe_rows,
        },
    )
    .context("Failed to open input for transform")?;
    let joined: Box<dyn lagpipe_engine::ChunkSource> = match joiner {
        Some(joiner) => Box::new(JoiningSource::new(raw, joiner)),
        None => Box::new(raw),
    };
    let source = ImputingSource::new(joined, plan);

    let transformed_path = args.output.join("transformed.csv");
    let sink = CsvSink::create(&transformed_path).context("Failed to create transformed.csv")?;
    let engine = LagTransformEngine::new(spec.clone());
    let mut driver = PipelineDriver::new(engine, source, sink);
    let summary = driver.run().context("Transform run failed")?;
    driver.into_sink().finish().context("Failed to flush transformed.csv")?;
    info!(
        "Transformed {} rows in {} chunks ({} probe chunks) -> {}",
        summary.rows_written,
        summary.real_chunks,
        summary.probe_chunks,
        transformed_path.display()
    );

    // Split the materialized feature table by year.
    let table = read_table(&transformed_path)?;
    let (train, test) = lagpipe_pipeline::split_by_year(&table, &args.date_column, args.split_year)
        .context("Train/test split failed")?;
    info!(
        "Split on year {}: {} train rows, {} test rows",
        args.split_year,
        train.row_count(),
        test.row_count()
    );

    // Feature selection: configured columns plus every lag column.
    let mut feature_columns = parse_list(&args.features);
    for &k in spec.offsets() {
        feature_columns.push(spec.output_name(k).to_string());
    }

    let encoder = DatasetEncoder::fit(&train, &feature_columns, args.target.clone())
        .context("Failed to fit dataset encoder")?;
    let train_data = encoder.encode(&train).context("Failed to encode training rows")?;
    let test_data = encoder.encode(&test).context("Failed to encode test rows")?;

    info!(
        "Training forest: {} trees, depth {}, {} features",
        args.trees,
        args.max_depth,
        train_data.feature_count()
    );
    let trainer = ForestTrainer::new(ForestConfig {
        num_trees: args.trees,
        max_depth: args.max_depth,
        min_samples_leaf: args.min_samples_leaf,
        learning_rate: args.learning_rate,
    });
    let forest = trainer.train(&train_data).context("Training failed")?;

    let model_path = args.output.join("model.json");
    std::fs::write(&model_path, forest.to_json()?).context("Failed to write model file")?;
    info!("Model saved to: {}", model_path.display());

    // Score the held-out years.
    let predictions = forest.predict(&test_data.features);
    let report = evaluate(&predictions, &test_data.targets).context("Evaluation failed")?;
    info!(
        "Held-out metrics: MAE={:.4} RMSE={:.4} RAE={:.4}",
        report.mae, report.rmse, report.rae
    );

    let metrics_path = args.output.join("metrics.json");
    std::fs::write(&metrics_path, serde_json::to_string_pretty(&report)?)
        .context("Failed to write metrics file")?;
    info!("Metrics saved to: {}", metrics_path.display());

    Ok(())
}
