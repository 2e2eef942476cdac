use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, bail};
use portfolio_common::config::{StorageAppConfig, StorageBackend};
use portfolio_common::storage::BlobStore;
use portfolio_common::storage::filesystem::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portfolio_server::config::AppConfig;
use portfolio_server::state::AppState;
use portfolio_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    info!("Database ready");

    let blob_store = init_blob_store(&config.storage).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = build_router(AppState {
        db,
        config,
        blob_store,
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_blob_store(config: &StorageAppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(
                config.base_path.clone(),
                config.public_base_url.clone(),
                config.max_image_size,
            )
            .await
            .with_context(|| format!("Failed to open {}", config.base_path.display()))?;
            info!(path = %config.base_path.display(), "Using filesystem blob storage");
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => s3_blob_store(config),
    }
}

#[cfg(feature = "object-storage")]
fn s3_blob_store(config: &StorageAppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    use portfolio_common::storage::s3::S3BlobStore;

    let Some(s3) = config.s3.as_ref() else {
        bail!("storage.backend is s3 but storage.s3 is not configured");
    };
    let store = S3BlobStore::new(s3, config.public_base_url.clone(), config.max_image_size)
        .context("Failed to initialize S3 blob storage")?;
    info!(bucket = %s3.bucket, "Using S3 blob storage");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "object-storage"))]
fn s3_blob_store(_config: &StorageAppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    bail!("storage.backend is s3 but the server was built without the object-storage feature")
}
