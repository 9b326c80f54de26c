use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use image_studio::{
    cache::{FileHistoryRepository, LocalFileStorage},
    config::StudioConfig,
    generator::{GenerationProxy, NebiusClient},
    identity::InMemoryIdentity,
    web_pages::{self, AppContext},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = StudioConfig::from_env()?;
    tracing::debug!(cache_dir = %config.cache_dir.display(), "Loaded configuration");

    let storage = Arc::new(LocalFileStorage::new(
        config.cache_dir.clone(),
        config.cache_base_url.clone(),
    ));
    let repository = Arc::new(FileHistoryRepository::new(storage.clone()));
    let client = NebiusClient::new(&config.nebius_base_url, &config.nebius_api_key)?;
    let proxy = Arc::new(GenerationProxy::new(client, storage.clone(), repository.clone()));
    let context = AppContext::new(Arc::new(InMemoryIdentity::new()), proxy, repository);
    let router = web_pages::router(context, storage.base_dir().to_path_buf());

    let tcp_listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Image studio started at http://{}", config.bind_address);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
