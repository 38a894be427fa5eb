use crate::config::CatalogConfig;
use crate::error::Result;
use crate::services::catalog::MlHubClient;
use std::sync::Arc;
use tracing::info;

pub fn setup_catalog(config: &CatalogConfig) -> Result<Arc<MlHubClient>> {
    if config.api_key.is_none() {
        tracing::warn!("MLHUB_API_KEY is not set; catalog requests may be rejected");
    }
    info!("🛰️  Catalog: {}", config.root_url);

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(Arc::new(MlHubClient::new(
        http,
        config.root_url.clone(),
        config.api_key.clone(),
    )))
}
