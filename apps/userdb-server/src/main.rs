//! HTTP server for the user database.
//!
//! Loads the last snapshot, serves the API, flushes changes on an
//! interval and once more on shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time;
use tracing_subscriber::EnvFilter;

use userdb_api::{router::Router, server::Server};
use userdb_core::config::DbConfig;
use userdb_core::database::Database;
use userdb_core::persistence::PersistenceManager;

/// Command-line arguments for the user database server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to bind to
    #[arg(long, env = "USER_DB_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "USER_DB_PORT", default_value_t = 8080)]
    port: u16,

    /// Snapshot directory; the database stays in memory when unset
    #[arg(long, env = "USER_DB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Root under which each asset gets its own directory
    #[arg(long, env = "USER_DB_ASSET_ROOT")]
    asset_root: Option<PathBuf>,

    /// Request body timeout in milliseconds
    #[arg(long, env = "USER_DB_REQUEST_TIMEOUT_MS", default_value_t = 30000)]
    request_timeout_ms: u64,

    /// Interval between snapshot flushes in milliseconds
    #[arg(long, env = "USER_DB_FLUSH_INTERVAL_MS", default_value_t = 1000)]
    flush_interval_ms: u64,

    /// Time given to open connections on shutdown in milliseconds
    #[arg(long, env = "USER_DB_SHUTDOWN_TIMEOUT_MS", default_value_t = 10000)]
    shutdown_timeout_ms: u64,
}

impl Args {
    fn config(&self) -> DbConfig {
        DbConfig {
            data_dir: self.data_dir.clone(),
            asset_root: self.asset_root.clone(),
            request_timeout_ms: self.request_timeout_ms,
            flush_interval_ms: self.flush_interval_ms,
            shutdown_timeout_ms: self.shutdown_timeout_ms,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(args.config());

    let persistence = config
        .data_dir
        .as_ref()
        .map(|dir| Arc::new(PersistenceManager::new(dir, &config)));

    let db = match &persistence {
        Some(persistence) => {
            let tables = persistence.load().with_context(|| {
                format!("Failed to load snapshot from {}", persistence.data_dir().display())
            })?;
            tracing::info!(
                "Loaded snapshot from {} ({} users, {} products, {} projects)",
                persistence.data_dir().display(),
                tables.users.len(),
                tables.products.len(),
                tables.projects.len()
            );
            Database::with_tables((*config).clone(), tables)
        }
        None => {
            tracing::warn!("No data directory configured, changes will not be persisted");
            Database::new((*config).clone())
        }
    };
    let db = Arc::new(db);

    let (stop_tx, stop_rx) = watch::channel(false);
    let flusher = persistence.clone().map(|persistence| {
        tokio::spawn(flush_loop(
            Arc::clone(&db),
            persistence,
            Duration::from_millis(config.flush_interval_ms),
            stop_rx,
        ))
    });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Starting user database server");
    tracing::info!("  Address: {}", addr);
    tracing::info!("  Data directory: {:?}", config.data_dir);
    tracing::info!("  Asset root: {:?}", config.asset_root);
    tracing::info!("  Request timeout: {} ms", config.request_timeout_ms);

    let server = Server::new(Router::new(Arc::clone(&db), Arc::clone(&config)));
    server.serve_with_shutdown(listener, shutdown_signal()).await?;

    let _ = stop_tx.send(true);
    if let Some(flusher) = flusher {
        if let Err(err) = flusher.await {
            tracing::error!("Flush task failed: {}", err);
        }
    }

    if let Some(persistence) = persistence {
        let flushed = tokio::task::spawn_blocking(move || persistence.flush_if_changed(&db))
            .await
            .context("Final flush task failed")?
            .context("Final flush failed")?;
        if flushed {
            tracing::info!("Wrote final snapshot");
        }
    }

    Ok(())
}

/// Flushes the database whenever it changed, until `stop` is set.
async fn flush_loop(
    db: Arc<Database>,
    persistence: Arc<PersistenceManager>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }

        let db = Arc::clone(&db);
        let persistence = Arc::clone(&persistence);
        match tokio::task::spawn_blocking(move || persistence.flush_if_changed(&db)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::error!("Snapshot flush failed: {}", err),
            Err(err) => tracing::error!("Snapshot flush task panicked: {}", err),
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl_c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
