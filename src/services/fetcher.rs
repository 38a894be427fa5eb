use crate::error::{IngestError, Result};
use crate::models::Dataset;
use crate::services::catalog::CatalogClient;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Downloads a dataset's archives and unpacks them next to themselves.
pub struct ArchiveFetcher {
    catalog: Arc<dyn CatalogClient>,
}

impl ArchiveFetcher {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }

    pub async fn fetch(&self, dataset: &Dataset, output_dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(output_dir).await?;

        let archives = self.catalog.download_archives(dataset, output_dir).await?;
        for archive in &archives {
            // Large archives can take several minutes to unpack.
            tracing::info!("Extracting {}...", archive.display());
            extract_archive(archive, output_dir).await?;
        }

        tracing::info!(
            "Fetched {} archives for dataset '{}'",
            archives.len(),
            dataset.id
        );
        Ok(archives)
    }
}

/// Unpacks a `.tar`, `.tar.gz` or `.tgz` archive into `dest` on a blocking
/// thread.
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || unpack(&archive, &dest))
        .await
        .map_err(|e| IngestError::Extraction(format!("Extraction task failed: {}", e)))?
}

fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let reader = BufReader::new(file);

    let result = if is_gzipped(archive) {
        unpack_from(GzDecoder::new(reader), dest)
    } else {
        unpack_from(reader, dest)
    };

    result.map_err(|e| {
        IngestError::Extraction(format!(
            "Failed to extract {}: {}",
            archive.display(),
            e
        ))
    })
}

fn unpack_from<R: Read>(reader: R, dest: &Path) -> std::io::Result<()> {
    tar::Archive::new(reader).unpack(dest)
}

fn is_gzipped(archive: &Path) -> bool {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".gz") || name.ends_with(".tgz")
}
