use crate::error::Result;
use crate::models::{Collection, Dataset};
use crate::services::catalog::CatalogClient;
use crate::services::fetcher::ArchiveFetcher;
use crate::services::inspect;
use crate::services::uploader::{DirectoryUploader, UploadSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub skip_download: bool,
    pub skip_upload: bool,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub dataset: Dataset,
    pub samples: Vec<Collection>,
    pub archives: Vec<PathBuf>,
    pub upload: Option<UploadSummary>,
}

/// Runs inspection, fetch and upload for one dataset, in that order.
/// Any failure ends the run; nothing is retried.
pub struct IngestPipeline {
    catalog: Arc<dyn CatalogClient>,
    fetcher: ArchiveFetcher,
    uploader: DirectoryUploader,
}

impl IngestPipeline {
    pub fn new(catalog: Arc<dyn CatalogClient>, uploader: DirectoryUploader) -> Self {
        Self {
            fetcher: ArchiveFetcher::new(catalog.clone()),
            catalog,
            uploader,
        }
    }

    pub async fn list_collection_metadata(&self, dataset_id: &str) -> Result<Dataset> {
        let dataset = self.catalog.fetch_dataset(dataset_id).await?;
        println!("{}", inspect::format_collection_listing(&dataset));
        Ok(dataset)
    }

    /// Prints the first item of every collection in `dataset`.
    pub async fn explore_collections(&self, dataset: &Dataset) -> Result<Vec<Collection>> {
        let mut samples = Vec::with_capacity(dataset.collections.len());
        for collection in &dataset.collections {
            let items = self.catalog.list_collection_items(&collection.id, 1).await?;
            if items.is_empty() {
                tracing::warn!("Collection '{}' has no items", collection.id);
                continue;
            }

            let sample = Collection {
                id: collection.id.clone(),
                items,
            };
            println!("{}\n", inspect::format_collection_summary(&sample));
            samples.push(sample);
        }
        Ok(samples)
    }

    pub async fn run(
        &self,
        dataset_id: &str,
        download_dir: &Path,
        bucket: &str,
        options: PipelineOptions,
    ) -> Result<PipelineReport> {
        tracing::info!("Ingesting dataset '{}'", dataset_id);

        let dataset = self.list_collection_metadata(dataset_id).await?;
        let samples = self.explore_collections(&dataset).await?;

        let archives = if options.skip_download {
            tracing::info!("Skipping download of '{}'", dataset_id);
            tokio::fs::create_dir_all(download_dir).await?;
            Vec::new()
        } else {
            self.fetcher.fetch(&dataset, download_dir).await?
        };

        let upload = if options.skip_upload {
            tracing::info!("Skipping upload to bucket '{}'", bucket);
            None
        } else {
            Some(self.uploader.upload(download_dir, bucket).await?)
        };

        Ok(PipelineReport {
            dataset,
            samples,
            archives,
            upload,
        })
    }
}
