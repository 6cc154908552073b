use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use northwind_core::{
    transform, DirectorySink, OutputFormat, RawSalesSource, TransformOptions,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about = "Northwind sales ETL: clean the raw extract and build analysis tables", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw sales extract, aggregate it and write every result table
    Transform(TransformArgs),
    /// Print the effective transform options as TOML
    ShowConfig(ConfigArgs),
}

#[derive(Args, Debug)]
struct TransformArgs {
    /// Directory holding the raw sales extract
    #[arg(long, env = "NORTHWIND_RAW_DIR", default_value = "data/raw")]
    raw_dir: PathBuf,
    /// Directory receiving the cleaned and aggregated tables
    #[arg(long, env = "NORTHWIND_PROCESSED_DIR", default_value = "data/processed")]
    out_dir: PathBuf,
    /// Output file format (csv or parquet)
    #[arg(long, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
    /// Write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// TOML file overriding the default transform options
    #[arg(long, env = "NORTHWIND_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    match cli.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    match cli.command {
        Command::Transform(args) => handle_transform(args),
        Command::ShowConfig(args) => handle_show_config(args),
    }
}

fn load_options(args: &ConfigArgs) -> Result<TransformOptions> {
    match &args.config {
        Some(path) => TransformOptions::from_path(path)
            .with_context(|| format!("failed to load transform options from {}", path.display())),
        None => Ok(TransformOptions::default()),
    }
}

fn handle_transform(args: TransformArgs) -> Result<()> {
    let options = load_options(&args.config)?;

    let extract = RawSalesSource::new(&args.raw_dir)
        .load()
        .with_context(|| format!("no usable sales extract in {}", args.raw_dir.display()))?;

    let output = transform(&extract.dataframe, &options).context("transformation failed")?;

    let mut sink = DirectorySink::new(&args.out_dir, args.format)
        .context("failed to prepare output directory")?;
    output
        .publish(&mut sink)
        .context("failed to write transformed tables")?;
    info!(
        tables = sink.written().len(),
        dir = %sink.dir().display(),
        "transformation finished"
    );

    if let Some(path) = &args.summary_json {
        write_summary_json(path, &output.summary)?;
    }

    println!("{}", report::render(&output, sink.written()));
    Ok(())
}

fn write_summary_json(path: &Path, summary: &northwind_core::TransformSummary) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(summary).context("failed to serialize run summary")?;
    fs::write(path, bytes)
        .with_context(|| format!("failed to write run summary to {}", path.display()))
}

fn handle_show_config(args: ConfigArgs) -> Result<()> {
    let options = load_options(&args)?;
    options.validate()?;
    let rendered = toml::to_string_pretty(&options).context("failed to render options")?;
    println!("{rendered}");
    Ok(())
}
