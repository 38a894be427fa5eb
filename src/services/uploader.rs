use crate::error::{IngestError, Result};
use crate::services::object::{ObjectHandle, WaitPolicy};
use crate::services::storage::StorageService;
use crate::utils::keys::{self, KeyScheme};
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub files: usize,
    pub bytes: u64,
    /// Keys in the order they were uploaded.
    pub keys: Vec<String>,
}

/// Mirrors a local directory tree into a bucket, one file at a time.
pub struct DirectoryUploader {
    storage: Arc<dyn StorageService>,
    scheme: KeyScheme,
    wait: WaitPolicy,
}

impl DirectoryUploader {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self {
            storage,
            scheme: KeyScheme::default(),
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_key_scheme(mut self, scheme: KeyScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Uploads every file under `root` to `bucket`.
    ///
    /// Files are visited in filesystem order. The first failed put aborts
    /// the whole upload; nothing after it is attempted.
    pub async fn upload(&self, root: &Path, bucket: &str) -> Result<UploadSummary> {
        if !root.is_dir() {
            return Err(IngestError::InvalidArgument(format!(
                "'{}' is not a directory",
                root.display()
            )));
        }

        let prefix = keys::key_prefix(root, self.scheme)?;
        tracing::info!(
            "Uploading {} to bucket '{}' (key prefix: {})",
            root.display(),
            bucket,
            prefix.as_deref().unwrap_or("<none>")
        );

        let mut summary = UploadSummary::default();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            // Follows symlinks, so linked directories are skipped too.
            if entry.path().is_dir() {
                continue;
            }

            let key = keys::object_key(prefix.as_deref(), root, entry.path())?;
            let bytes = ObjectHandle::new(self.storage.as_ref(), bucket, &key)
                .with_wait_policy(self.wait)
                .put(entry.path())
                .await?;

            summary.files += 1;
            summary.bytes += bytes;
            summary.keys.push(key);
        }

        tracing::info!(
            "Uploaded {} files ({} bytes) to bucket '{}'",
            summary.files,
            summary.bytes,
            bucket
        );
        Ok(summary)
    }
}
