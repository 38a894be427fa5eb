use dotenvy::dotenv;
use mlhub_ingest::config::IngestConfig;
use mlhub_ingest::infrastructure::catalog;
use mlhub_ingest::services::catalog::CatalogClient;
use mlhub_ingest::services::inspect;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "list_datasets=info,mlhub_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = IngestConfig::from_env()?;
    let client = catalog::setup_catalog(&config.catalog)?;

    let datasets = client.list_datasets().await?;
    info!("📚 {} datasets available", datasets.len());
    println!("{}", inspect::format_dataset_ids(&datasets));
    Ok(())
}
