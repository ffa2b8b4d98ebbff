use anyhow::Context;
use rutakids_backend::config::ServerConfig;
use rutakids_backend::domain::sync_service::{FIRST_RETRY_DELAY, MAX_RETRY_DELAY};
use rutakids_backend::{create_router, initialize_backend};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!("Data directory: {}", config.data_dir.display());

    let backend = initialize_backend(&config)?;

    if let Some(sync) = backend.sync.clone() {
        // Autosave only starts once the remote state has been read
        tokio::spawn(async move {
            let outcome = sync.bootstrap_until_ready(FIRST_RETRY_DELAY, MAX_RETRY_DELAY).await;
            info!("Sync ready: {:?}", outcome);
            sync.run().await;
        });
    }

    let app = create_router(backend.state, &config)?;

    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("RutaKids listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await?;

    // Flush anything the debounce window was still holding
    match backend.sync {
        Some(sync) if sync.is_ready() => {
            if let Err(e) = sync.push_now().await {
                error!("Final sync push failed: {:#}", e);
            }
        }
        Some(_) => warn!("Remote state was never loaded, skipping final sync push"),
        None => {}
    }
    Ok(())
}
