//! peertube-rs redundancy daemon entry point.

use std::sync::Arc;

use peertube_common::Config;
use peertube_db::repositories::VideoRedundancyRepository;
use peertube_queue::{
    DbRedundancyExecutor, HlsDownloader, PlaylistDownloader, RedundancyDirectoryRemover,
    run_redundancy_scheduler,
};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USER_AGENT: &str = concat!("peertube-rs/", env!("CARGO_PKG_VERSION"));

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peertube=debug,sqlx=warn".into()),
        )
        .init();

    info!("Starting peertube-rs redundancy daemon...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(peertube_db::init(&config).await?);
    info!("Connected to database");

    let server_actor_id = VideoRedundancyRepository::load_server_actor_id(&db).await?;
    info!(server_actor_id, "Loaded server actor");

    let repo = VideoRedundancyRepository::new(Arc::clone(&db), server_actor_id).with_file_remover(
        Arc::new(RedundancyDirectoryRemover::new(
            config.storage.redundancy_dir.clone(),
        )),
    );

    let downloader: Arc<dyn PlaylistDownloader> = Arc::new(HlsDownloader::new(
        USER_AGENT,
        config.redundancy.download_timeout(),
    )?);

    let executor = Arc::new(DbRedundancyExecutor::new(repo, downloader, &config));

    info!(
        strategies = config.redundancy.strategies.len(),
        interval = ?config.redundancy.check_interval(),
        "Starting redundancy scheduler"
    );
    let scheduler = run_redundancy_scheduler(config.redundancy.clone(), executor);

    shutdown_signal().await;

    scheduler.abort();
    info!("Server shutdown complete");

    Ok(())
}
