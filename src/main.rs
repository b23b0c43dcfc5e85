use anyhow::Result;
use clap::Parser;
use fmexport::lastfm::LastfmClient;
use fmexport::pool::{PersistTask, SnapshotPool};
use fmexport::store::ArtistStore;
use fmexport::walker::Walker;
use fmexport::{Config, VisitedRegistry};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "fmexport")]
#[command(about = "Crawl the Last.fm similar-artist graph and store artist snapshots")]
struct Args {
    /// Artist to start the crawl from (overrides crawl.seed from config.toml)
    #[arg(short, long)]
    seed: Option<String>,

    /// Number of concurrent persist workers (overrides crawl.workers)
    #[arg(short, long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();

    let config = Config::load()?;
    let seed = args.seed.unwrap_or_else(|| config.crawl.seed.clone());
    let workers = args.workers.unwrap_or(config.crawl.workers);

    log::info!("Starting fmexport v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Seed artist: {}", seed);
    log::info!("Persist workers: {}", workers);
    log::info!("Database path: {}", config.db_path().display());

    let store = Arc::new(ArtistStore::new(config.db_path()));
    store.init_schema().await?;

    let client = Arc::new(LastfmClient::new(
        config.api_key()?,
        config.base_url()?,
        config.lastfm.timeout_secs,
    )?);

    let mut pool = SnapshotPool::spawn(client.clone(), store.clone(), workers);
    let outcomes = pool.take_outcomes();

    // The seed's own snapshot comes from this explicit submission; the walk
    // only submits artists it discovers as neighbors.
    pool.submit(PersistTask {
        artist: seed.clone(),
    });

    let mut registry = VisitedRegistry::new();
    let stats = Walker::new(client.as_ref(), &mut registry, &pool)
        .walk(&seed)
        .await?;

    log::info!(
        "Walk finished: {} artist(s) claimed, {} task(s) submitted, {} neighbor queries",
        stats.artists_claimed,
        stats.tasks_submitted,
        stats.queries
    );

    // Let the pool drain whatever the walk left queued, then report.
    pool.close_and_join().await;

    if let Some(mut outcomes) = outcomes {
        let mut persisted = 0usize;
        let mut failed = 0usize;
        while let Ok(outcome) = outcomes.try_recv() {
            match outcome.result {
                Ok(()) => persisted += 1,
                Err(_) => failed += 1,
            }
        }
        log::info!("Snapshots persisted: {}, failed: {}", persisted, failed);
        if failed > 0 {
            log::warn!("{} artist(s) failed to persist and will not be retried", failed);
        }
    }

    log::info!("{} artist(s) in store", store.count().await?);

    Ok(())
}
