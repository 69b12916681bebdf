use clap::{Parser, Subcommand, Args};
use stroke_query::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Context;

#[derive(Parser)]
#[command(name = "stroke-cli")]
#[command(about = "Stroke dataset CLI - serve, query and summarize the stroke prediction dataset", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset and serve the HTTP API
    Serve(ServeArgs),
    /// Show summary statistics for a dataset
    Stats(DataArgs),
    /// Filter patients by gender, stroke outcome or maximum age
    Query(QueryArgs),
    /// Show a single patient by id
    Get(GetArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Dataset file (Parquet or CSV)
    #[arg(short, long, env = "STROKE_DATA_PATH")]
    data: Option<PathBuf>,
    /// Drop invalid rows instead of failing
    #[arg(long)]
    skip_invalid: bool,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(short, long, env = "STROKE_BIND_ADDR")]
    bind: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct QueryArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Exact gender value (Male, Female, Other)
    #[arg(long)]
    gender: Option<String>,
    /// Stroke outcome (0 or 1)
    #[arg(long)]
    stroke: Option<u8>,
    /// Keep patients at or below this age
    #[arg(long)]
    max_age: Option<f64>,
    /// Limit number of results
    #[arg(long, default_value_t = 20)]
    limit: usize,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GetArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Patient id
    id: i64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!(e.user_message()))?
            .with_env_overrides(|key| std::env::var(key).ok()),
        None => ServiceConfig::load(),
    };
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Serve(args) => cmd_serve(config, args),
        Commands::Stats(args) => cmd_stats(config, args),
        Commands::Query(args) => cmd_query(config, args),
        Commands::Get(args) => cmd_get(config, args),
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Apply dataset flags on top of the loaded config
fn apply_data_args(config: ServiceConfig, args: &DataArgs) -> ServiceConfig {
    let mut builder = ConfigBuilder::from_config(config);
    if let Some(data) = &args.data {
        builder = builder.data_path(data);
    }
    if args.skip_invalid {
        builder = builder.skip_invalid_records(true);
    }
    builder.build()
}

fn load_dataset(config: &ServiceConfig) -> anyhow::Result<PatientDataset> {
    config
        .dataset_builder()
        .build()
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Error loading dataset from {}", config.data_path.display()))
}

fn cmd_serve(config: ServiceConfig, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = apply_data_args(config, &args.data);
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    config.validate().map_err(|e| anyhow::anyhow!(e.user_message()))?;

    // The listener is only bound once the dataset is fully loaded
    let dataset = Arc::new(load_dataset(&config)?);
    tracing::info!(
        patients = dataset.len(),
        loaded_at = %dataset.loaded_at(),
        "dataset ready"
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    runtime
        .block_on(stroke_query::server::serve(&config, dataset))
        .map_err(|e| anyhow::anyhow!(e.user_message()))
}

fn cmd_stats(config: ServiceConfig, args: DataArgs) -> anyhow::Result<()> {
    let config = apply_data_args(config, &args);
    let dataset = load_dataset(&config)?;
    dataset.statistics()?.print_summary();

    let analytics = dataset.analytics();
    let breakdown = analytics.stroke_breakdown()?;
    println!();
    println!("=== Stroke Breakdown ===");
    println!("With stroke: {}", breakdown.with_stroke);
    println!("Without stroke: {}", breakdown.without_stroke);
    println!("Smokers among stroke patients: {}", breakdown.stroke_smokers);
    println!("Non-smokers among stroke patients: {}", breakdown.stroke_non_smokers);

    println!();
    println!("=== Patients by Gender ===");
    for (gender, count) in analytics.count_by_gender() {
        println!("{}: {}", gender, count);
    }
    println!();
    println!("=== Patients by Smoking Status ===");
    for (status, count) in analytics.count_by_smoking_status() {
        println!("{}: {}", status, count);
    }
    Ok(())
}

fn cmd_query(config: ServiceConfig, args: QueryArgs) -> anyhow::Result<()> {
    let config = apply_data_args(config, &args.data);
    let dataset = load_dataset(&config)?;
    let service = PatientService::new(Arc::new(dataset));

    let filter = PatientFilter {
        gender: args.gender,
        stroke: args.stroke,
        max_age: args.max_age,
    };
    let results = service.filter_patients(&filter)?;
    let shown: Vec<&PatientRecord> = results.iter().take(args.limit).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        for patient in &shown {
            println!(
                "{} | {} | {} | stroke={} | bmi={}",
                patient.id,
                patient.gender,
                patient.age,
                patient.stroke,
                patient.bmi.map(|b| b.to_string()).unwrap_or_else(|| "n/a".to_string())
            );
        }
    }
    println!("Total matches: {}", results.len());
    Ok(())
}

fn cmd_get(config: ServiceConfig, args: GetArgs) -> anyhow::Result<()> {
    let config = apply_data_args(config, &args.data);
    let dataset = load_dataset(&config)?;
    let service = PatientService::new(Arc::new(dataset));

    let patient = service.get_by_id(args.id)?;
    println!("{}", serde_json::to_string_pretty(&patient)?);
    Ok(())
}
