use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use off_catalog_ingest::config::{Config, DownloadStrategy};
use off_catalog_ingest::orchestrator::import_url;
use off_catalog_ingest::sink::PostgresEntrySink;
use off_catalog_ingest::source::{ChunkSource, RangedChunkSource, RetryPolicy, StreamingChunkSource};

#[derive(Parser)]
#[command(name = "off-catalog-ingest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ingests the OpenFoodFacts product dump into a normalized catalog")]
struct Cli {
    /// URL of the gzip-compressed NDJSON feed to ingest
    url: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured chunk size, in bytes
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Override the configured commit interval, in records
    #[arg(long)]
    commit_interval: Option<usize>,

    /// Override the configured database URL
    #[arg(short = 'd', long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(chunk_size) = cli.chunk_size {
        config.pipeline.chunk_size = chunk_size;
    }
    if let Some(commit_interval) = cli.commit_interval {
        config.pipeline.commit_interval = commit_interval;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    config.logging.init();
    info!(url = %cli.url, "starting ingestion");

    let exit_code = match run(&cli.url, &config).await {
        Ok(counters) => {
            info!(total = counters.total, valid = counters.valid, "ingestion finished");
            0
        }
        Err(e) => {
            error!(error = %e, "ingestion failed");
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

async fn run(url: &str, config: &Config) -> Result<off_catalog_ingest::orchestrator::Counters, off_catalog_ingest::errors::IngestError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(off_catalog_ingest::errors::SinkError::Connection)?;
    let mut sink = PostgresEntrySink::new(pool);

    let client = Client::builder().build().expect("failed to build HTTP client");
    let retry_policy: RetryPolicy = (&config.pipeline).into();

    let mut source: Box<dyn ChunkSource> = match config.pipeline.download_strategy {
        DownloadStrategy::Streaming => {
            Box::new(StreamingChunkSource::new(client, url, config.pipeline.chunk_size, retry_policy))
        }
        DownloadStrategy::Ranged => Box::new(RangedChunkSource::new(
            client,
            url,
            config.pipeline.chunk_size as u64,
            retry_policy,
        )),
    };

    let cancellation = CancellationToken::new();
    let shutdown = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let counters = import_url(source.as_mut(), &mut sink, config.pipeline.commit_interval, cancellation).await?;
    Ok(counters)
}
