use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use sales_cleaner::app::{CleanFileUseCase, HandlerResponse, ObjectStorePort, SummaryStorePort};
use sales_cleaner::config::Config;
use sales_cleaner::infra::{FsObjectStore, SqliteSummaryStore};
use sales_cleaner::observability::{init_logging, init_metrics, metrics};

/// Output bucket for `process` when none is configured
const LOCAL_OUTPUT_BUCKET: &str = "cleaned";
/// Source bucket recorded for files read straight from disk
const LOCAL_SOURCE_BUCKET: &str = "local";

#[derive(Parser)]
#[command(name = "sales_cleaner")]
#[command(about = "Validate, clean, enrich and deduplicate sales-order CSV files")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to sales_cleaner.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a local CSV file
    Process {
        /// CSV file to clean
        file: PathBuf,
        /// Directory that receives the output bucket (defaults to the store root)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Print the Prometheus metrics snapshot when done
        #[arg(long)]
        print_metrics: bool,
    },
    /// Run the trigger handler on an S3-style event against the filesystem store
    Handle {
        /// JSON file holding the event
        #[arg(long)]
        event: PathBuf,
    },
    /// List stored processing summaries, newest first
    Summaries {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging();
    init_metrics();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Process {
            file,
            output_dir,
            print_metrics,
        } => {
            process_local(&config, &file, output_dir).await?;
            if print_metrics {
                match metrics::render() {
                    Some(snapshot) => println!("{}", snapshot),
                    None => println!("No in-process metrics recorder installed"),
                }
            }
            Ok(())
        }
        Commands::Handle { event } => handle_event(&config, &event).await,
        Commands::Summaries { limit } => list_summaries(&config, limit).await,
    }
}

fn open_summaries(config: &Config) -> anyhow::Result<Arc<dyn SummaryStorePort>> {
    let path = config.storage.summary_db_path();
    let store = SqliteSummaryStore::open(&path)
        .with_context(|| format!("opening summary store at {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn process_local(
    config: &Config,
    file: &Path,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let key = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("input path has no usable file name")?;

    let root = output_dir.unwrap_or_else(|| config.storage.store_root());
    let store: Arc<dyn ObjectStorePort> = Arc::new(FsObjectStore::new(root));
    let output_bucket = config
        .storage
        .output_bucket()
        .unwrap_or(LOCAL_OUTPUT_BUCKET)
        .to_string();
    let use_case = CleanFileUseCase::new(
        store,
        open_summaries(config)?,
        sales_cleaner::pipeline::Pipeline::from_config(&config.pipeline),
        config.output.clone(),
        output_bucket,
    );

    println!("🔄 Cleaning {}...", file.display());
    let outcome = use_case.process_bytes(LOCAL_SOURCE_BUCKET, key, &bytes).await?;
    let summary = &outcome.summary;
    info!(
        "Accepted {} of {} records from {}",
        summary.row_count, summary.processed_count, key
    );

    println!(
        "✅ {} accepted, {} skipped",
        summary.row_count, summary.skipped_count
    );
    for (reason, count) in &summary.rejection_reasons {
        println!("   {}: {}", reason, count);
    }
    if summary.outputs.is_empty() {
        println!("⚠️  No valid data found; nothing written");
    }
    for location in &summary.outputs {
        println!("   wrote {}", location);
    }
    Ok(())
}

async fn handle_event(config: &Config, event_path: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(event_path)
        .await
        .with_context(|| format!("reading event {}", event_path.display()))?;
    let event: serde_json::Value = serde_json::from_str(&raw).context("parsing event JSON")?;

    let store: Arc<dyn ObjectStorePort> =
        Arc::new(FsObjectStore::new(config.storage.store_root()));
    let response = match CleanFileUseCase::from_config(config, store, open_summaries(config)?) {
        Ok(use_case) => use_case.handle(event).await,
        Err(e) => {
            error!("Cannot build trigger handler: {}", e);
            HandlerResponse::new(500, format!("Error processing file: {}", e))
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.status_code != 200 {
        anyhow::bail!("handler returned status {}", response.status_code);
    }
    Ok(())
}

async fn list_summaries(config: &Config, limit: usize) -> anyhow::Result<()> {
    let summaries = open_summaries(config)?.list_summaries(limit).await?;
    if summaries.is_empty() {
        println!("No processing summaries recorded yet");
        return Ok(());
    }
    for s in summaries {
        println!(
            "{}  {}/{}  rows={} cols={} skipped={} outputs={}",
            s.processed_at.format("%Y-%m-%d %H:%M:%S"),
            s.source_bucket,
            s.source_key,
            s.row_count,
            s.column_count,
            s.skipped_count,
            s.outputs.len()
        );
    }
    Ok(())
}
