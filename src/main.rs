use clap::Parser;
use dotenvy::dotenv;
use mlhub_ingest::config::IngestConfig;
use mlhub_ingest::infrastructure::{catalog, storage};
use mlhub_ingest::services::orchestrator::{IngestPipeline, PipelineOptions};
use mlhub_ingest::services::uploader::DirectoryUploader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Download an MLHub dataset and mirror it to S3", long_about = None)]
struct Args {
    /// Dataset to ingest (overrides MLHUB_DATASET_ID)
    #[arg(long)]
    dataset_id: Option<String>,

    /// Download directory (overrides DOWNLOAD_DIR)
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Target bucket (overrides AWS_BUCKET_NAME)
    #[arg(long)]
    bucket: Option<String>,

    /// Reuse whatever is already in the download directory
    #[arg(long)]
    skip_download: bool,

    /// Stop after downloading and extracting
    #[arg(long)]
    skip_upload: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlhub_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = IngestConfig::from_env()?;
    if let Some(dataset_id) = args.dataset_id {
        config.dataset_id = dataset_id;
    }
    if let Some(download_dir) = args.download_dir {
        config.download_dir = download_dir;
    }
    if args.bucket.is_some() {
        config.bucket = args.bucket;
    }

    // Fail before any download if the upload could never happen.
    let bucket = if args.skip_upload {
        config.bucket.clone().unwrap_or_default()
    } else {
        config.bucket()?.to_string()
    };

    info!(
        "🚀 Ingesting '{}' into {} (bucket: {})",
        config.dataset_id,
        config.download_dir.display(),
        if bucket.is_empty() { "<none>" } else { bucket.as_str() }
    );

    let catalog_client = catalog::setup_catalog(&config.catalog)?;
    let storage_service = storage::setup_storage(&config.storage).await;

    let uploader = DirectoryUploader::new(storage_service)
        .with_key_scheme(config.key_scheme)
        .with_wait_policy(config.storage.wait);
    let pipeline = IngestPipeline::new(catalog_client, uploader);

    println!();
    let report = pipeline
        .run(
            &config.dataset_id,
            &config.download_dir,
            &bucket,
            PipelineOptions {
                skip_download: args.skip_download,
                skip_upload: args.skip_upload,
            },
        )
        .await?;
    println!();

    match report.upload {
        Some(summary) => info!(
            "✅ Done: {} archives, {} files uploaded ({} bytes)",
            report.archives.len(),
            summary.files,
            summary.bytes
        ),
        None => info!("✅ Done: {} archives, upload skipped", report.archives.len()),
    }
    Ok(())
}
