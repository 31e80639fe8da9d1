//! dossier entry point.
//!
//! Each `run` invocation processes exactly one batch and exits; schedule it
//! externally (cron, a CI timer) until `status` reports completion. Logs go
//! to stderr as JSON so stdout stays clean for command output.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use figment::providers::Serialized;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dossier_cli::{RunController, RunOutcome, RunSettings, load_url_list};
use dossier_client::{FetchClient, FetchConfig, PageFetcher};
use dossier_core::checkpoint::{clear_progress, load_checkpoint, load_completion};
use dossier_core::{AppConfig, DatasetItem, FetchMode, StateDb};

#[derive(Debug, Parser)]
#[command(name = "dossier", version, about = "Batch profile extraction with resumable checkpoints")]
struct Cli {
    /// SQLite state database (overrides DOSSIER_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process the next batch and exit.
    Run {
        /// File with one URL per line.
        #[arg(long)]
        urls: PathBuf,

        /// URLs per batch (overrides DOSSIER_URLS_PER_BATCH).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Batch to start from when no checkpoint exists yet.
        #[arg(long)]
        current_batch: Option<u64>,

        /// How pages are fetched.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Print the stored checkpoint or completion record.
    Status,
    /// Write every dataset row as JSON lines.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Forget progress so the next run starts over. Dataset rows are kept.
    Reset,
    /// Print the JSON Schema of a dataset row.
    Schema,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Rendered,
    Http,
}

impl From<ModeArg> for FetchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rendered => FetchMode::Rendered,
            ModeArg::Http => FetchMode::Http,
        }
    }
}

/// Command-line values layered over env and file configuration.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    db_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    urls_per_batch: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_batch: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch_mode: Option<FetchMode>,
}

fn load_config(overrides: Overrides) -> Result<AppConfig> {
    let figment = AppConfig::figment().merge(Serialized::defaults(overrides));
    AppConfig::from_figment(figment).context("loading configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let overrides = Overrides { db_path: cli.db, ..Overrides::default() };

    match cli.command {
        Command::Run { urls, batch_size, current_batch, mode } => {
            let config = load_config(Overrides {
                urls_per_batch: batch_size,
                current_batch,
                fetch_mode: mode.map(FetchMode::from),
                ..overrides
            })?;
            run_batch(&config, &urls).await
        }
        Command::Status => status(&load_config(overrides)?).await,
        Command::Export { output } => export(&load_config(overrides)?, output.as_deref()).await,
        Command::Reset => reset(&load_config(overrides)?).await,
        Command::Schema => {
            let schema = schemars::schema_for!(DatasetItem);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

async fn run_batch(config: &AppConfig, urls_path: &Path) -> Result<()> {
    let urls = load_url_list(urls_path).await?;
    let db = StateDb::open(&config.db_path).await?;
    let settings = RunSettings::from_config(config);

    tracing::info!(
        urls = urls.len(),
        urls_per_batch = config.urls_per_batch,
        mode = ?config.fetch_mode,
        db = %config.db_path.display(),
        "starting run"
    );

    let outcome = match config.fetch_mode {
        FetchMode::Http => {
            let client = FetchClient::new(FetchConfig {
                user_agent: config.user_agent.clone(),
                timeout: config.timeout(),
                ..FetchConfig::default()
            })?;
            drive(&client, &db, settings, &urls).await?
        }
        FetchMode::Rendered => run_rendered(config, &db, settings, &urls).await?,
    };

    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}

async fn drive<F>(fetcher: &F, db: &StateDb, settings: RunSettings, urls: &[String]) -> Result<RunOutcome>
where
    F: PageFetcher + ?Sized,
{
    Ok(RunController::new(fetcher, db, settings).run(urls).await?)
}

#[cfg(feature = "render")]
async fn run_rendered(config: &AppConfig, db: &StateDb, settings: RunSettings, urls: &[String]) -> Result<RunOutcome> {
    let renderer = dossier_client::HeadlessRenderer::launch(config.user_agent.clone())
        .await
        .map_err(dossier_core::Error::from)?;
    let outcome = drive(&renderer, db, settings, urls).await;
    renderer.close().await;
    outcome
}

#[cfg(not(feature = "render"))]
async fn run_rendered(_: &AppConfig, _: &StateDb, _: RunSettings, _: &[String]) -> Result<RunOutcome> {
    Err(dossier_core::Error::RenderDisabled).context("rebuild with the `render` feature or use --mode http")
}

async fn status(config: &AppConfig) -> Result<()> {
    let db = StateDb::open(&config.db_path).await?;
    let counts = db.count_items().await?;
    let report = serde_json::json!({
        "nextBatch": load_checkpoint(&db).await?,
        "processingComplete": load_completion(&db).await?,
        "dataset": { "total": counts.total, "failed": counts.failed },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn export(config: &AppConfig, output: Option<&Path>) -> Result<()> {
    let db = StateDb::open(&config.db_path).await?;
    let items = db.list_items().await?;

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);
    for item in &items {
        serde_json::to_writer(&mut out, item)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    tracing::info!(rows = items.len(), "exported dataset");
    Ok(())
}

async fn reset(config: &AppConfig) -> Result<()> {
    let db = StateDb::open(&config.db_path).await?;
    if clear_progress(&db).await? {
        tracing::info!("progress cleared; the next run starts from the configured batch");
    } else {
        tracing::info!("no progress recorded; nothing to reset");
    }
    Ok(())
}
