use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filevault::config::Config;
use filevault::db::Database;
use filevault::services::{IdentityProvider, Reconciler, VaultEngine, VaultLimits};
use filevault::storage::{BlobStore, LocalBlobStore, StagingArea};
use filevault::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filevault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting filevault...");

    // Load configuration
    let config = Arc::new(Config::load()?);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Initialize blob store
    let blob_root = Path::new(&config.storage.blob_path);
    let blobs = Arc::new(LocalBlobStore::new(blob_root));
    let staging = StagingArea::new(blob_root.join(".staging")).await?;
    tracing::info!(
        "Blob store: {} at {}, staging in {}",
        blobs.storage_type(),
        blobs.base_path().display(),
        staging.dir().display()
    );
    let engine = VaultEngine::new(
        db,
        blobs,
        staging,
        VaultLimits::from(&config.storage),
    );

    // Reconcile anything a previous run left half-done
    let reconciler = Reconciler::new(engine.clone());
    match reconciler.sweep().await {
        Ok(report) => tracing::info!("Startup sweep: {:?}", report),
        Err(e) => tracing::warn!("Startup sweep failed, continuing: {}", e),
    }
    if config.storage.sweep_interval_secs > 0 {
        reconciler.spawn(Duration::from_secs(config.storage.sweep_interval_secs));
    }

    let identity = Arc::new(IdentityProvider::new(&config.jwt)?);

    let state = AppState { engine, identity };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
