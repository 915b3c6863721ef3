//! mentord server binary.

use mentord::catalog::QuestionCatalog;
use mentord::config::Config;
use mentord::network::{Gateway, TokenIsSubject};
use mentord::state::Hub;
use mentord::store::DiskStore;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mentord.toml".to_string());
    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting mentord");

    let store = Arc::new(DiskStore::open(&config.database.path)?);
    let catalog = QuestionCatalog::new(config.catalog.questions.clone());
    let hub = Hub::new(store, catalog, config.server.name.clone()).await?;

    let gateway = Gateway::bind(
        config.listen.address,
        config.listen.tls.as_ref(),
        hub,
        Arc::new(TokenIsSubject),
    )
    .await?;

    gateway.run().await
}
