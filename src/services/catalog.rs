use crate::error::{IngestError, Result};
use crate::models::{Dataset, Item, ItemCollection};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// The subset of the dataset catalog this tool relies on.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_datasets(&self) -> Result<Vec<Dataset>>;
    async fn fetch_dataset(&self, dataset_id: &str) -> Result<Dataset>;
    async fn list_collection_items(&self, collection_id: &str, limit: usize) -> Result<Vec<Item>>;

    /// Downloads every archive of `dataset` into `output_dir` and returns
    /// the local archive paths.
    async fn download_archives(
        &self,
        dataset: &Dataset,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// HTTP client for the Radiant MLHub API.
pub struct MlHubClient {
    http: reqwest::Client,
    root_url: Url,
    api_key: Option<String>,
}

impl MlHubClient {
    pub fn new(http: reqwest::Client, root_url: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            root_url,
            api_key,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.root_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                IngestError::Config(format!(
                    "Catalog root URL cannot be used as a base: {}",
                    self.root_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response> {
        tracing::debug!("GET {}", url);
        let mut request = self.http.get(url.clone()).query(query);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Catalog(format!(
                "GET {} returned {}",
                url, status
            )));
        }
        Ok(response)
    }

    async fn download_to(&self, url: Url, dest: &Path) -> Result<()> {
        let mut response = self.get(url, &[]).await?;

        // Stream into a sibling `.part` file so an interrupted download is
        // never mistaken for a finished archive on the next run.
        let mut partial = dest.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let streamed = async {
            let mut file = tokio::fs::File::create(&partial).await?;
            let mut written = 0u64;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, IngestError>(written)
        }
        .await;

        let written = match streamed {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                tracing::error!("Download of {} failed: {}", dest.display(), e);
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, dest).await?;
        tracing::info!("Downloaded {} ({} bytes)", dest.display(), written);
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for MlHubClient {
    async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let url = self.endpoint(&["datasets"])?;
        Ok(self.get(url, &[]).await?.json().await?)
    }

    async fn fetch_dataset(&self, dataset_id: &str) -> Result<Dataset> {
        let url = self.endpoint(&["datasets", dataset_id])?;
        Ok(self.get(url, &[]).await?.json().await?)
    }

    async fn list_collection_items(&self, collection_id: &str, limit: usize) -> Result<Vec<Item>> {
        let url = self.endpoint(&["collections", collection_id, "items"])?;
        let page: ItemCollection = self
            .get(url, &[("limit", limit.to_string())])
            .await?
            .json()
            .await?;
        Ok(page.features.into_iter().take(limit).collect())
    }

    async fn download_archives(
        &self,
        dataset: &Dataset,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut archives = Vec::with_capacity(dataset.collections.len());
        for collection in &dataset.collections {
            let dest = output_dir.join(format!("{}.tar.gz", collection.id));
            let reusable = tokio::fs::metadata(&dest)
                .await
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false);

            if reusable {
                tracing::info!("Archive {} already present, skipping download", dest.display());
            } else {
                let url = self.endpoint(&["archive", &collection.id])?;
                self.download_to(url, &dest).await?;
            }
            archives.push(dest);
        }
        Ok(archives)
    }
}
