use crate::error::{IngestError, Result};
use crate::services::storage::StorageService;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

/// Payload for a single put: a file on disk or bytes already in memory.
#[derive(Debug, Clone)]
pub enum PutSource {
    File(PathBuf),
    Bytes(Bytes),
}

impl From<&Path> for PutSource {
    fn from(path: &Path) -> Self {
        PutSource::File(path.to_path_buf())
    }
}

impl From<PathBuf> for PutSource {
    fn from(path: PathBuf) -> Self {
        PutSource::File(path)
    }
}

/// A string is always read as a file name.
impl From<&str> for PutSource {
    fn from(path: &str) -> Self {
        PutSource::File(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for PutSource {
    fn from(data: Vec<u8>) -> Self {
        PutSource::Bytes(Bytes::from(data))
    }
}

impl From<Bytes> for PutSource {
    fn from(data: Bytes) -> Self {
        PutSource::Bytes(data)
    }
}

/// Polling schedule used while waiting for an object to become visible.
/// Defaults mirror the boto3 `object_exists` waiter: every 5s, 20 tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 20,
        }
    }
}

/// A single remote object addressed by bucket and key.
pub struct ObjectHandle<'a> {
    storage: &'a dyn StorageService,
    bucket: String,
    key: String,
    wait: WaitPolicy,
}

impl<'a> ObjectHandle<'a> {
    pub fn new(storage: &'a dyn StorageService, bucket: &str, key: &str) -> Self {
        Self {
            storage,
            bucket: bucket.to_string(),
            key: key.to_string(),
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Uploads `source` and blocks until the store reports the object.
    ///
    /// A file source that cannot be opened as a regular file fails with
    /// `InvalidArgument` before any request is sent. The file handle lives
    /// inside the request body and is dropped when the put finishes,
    /// whichever way it finishes. Returns the number of bytes sent.
    pub async fn put(&self, source: impl Into<PutSource>) -> Result<u64> {
        let (body, size) = match source.into() {
            PutSource::File(path) => open_body(&path).await?,
            PutSource::Bytes(data) => {
                let size = data.len() as u64;
                (ByteStream::from(data), size)
            }
        };

        let outcome = async {
            self.storage
                .put_object(&self.bucket, &self.key, body)
                .await?;
            self.wait_until_exists().await
        }
        .await;

        match outcome {
            Ok(()) => {
                tracing::info!("Put object '{}' to bucket '{}'.", self.key, self.bucket);
                Ok(size)
            }
            Err(e) => {
                tracing::error!(
                    "Couldn't put object '{}' to bucket '{}': {}",
                    self.key,
                    self.bucket,
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn wait_until_exists(&self) -> Result<()> {
        let attempts = self.wait.max_attempts.max(1);
        for attempt in 1..=attempts {
            if self.storage.object_exists(&self.bucket, &self.key).await? {
                return Ok(());
            }
            tracing::debug!(
                "Object '{}' not visible yet (attempt {}/{})",
                self.key,
                attempt,
                attempts
            );
            if attempt < attempts {
                sleep(self.wait.interval).await;
            }
        }

        Err(IngestError::Storage(format!(
            "Object '{}' in bucket '{}' did not appear after {} attempts",
            self.key, self.bucket, attempts
        )))
    }
}

async fn open_body(path: &Path) -> Result<(ByteStream, u64)> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(
                "Expected file name or binary data, got '{}': {}",
                path.display(),
                e
            );
            return Err(IngestError::InvalidArgument(format!(
                "Expected file name or binary data, got '{}': {}",
                path.display(),
                e
            )));
        }
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        tracing::error!("Expected file name or binary data, got '{}'", path.display());
        return Err(IngestError::InvalidArgument(format!(
            "Expected file name or binary data, got '{}': not a regular file",
            path.display()
        )));
    }

    let body = ByteStream::read_from()
        .file(file)
        .build()
        .await
        .map_err(|e| {
            IngestError::Io(std::io::Error::other(format!(
                "Failed to stream '{}': {}",
                path.display(),
                e
            )))
        })?;

    Ok((body, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports the object as missing for the first `hidden_for` probes.
    struct SlowStore {
        hidden_for: u32,
        probes: AtomicU32,
        puts: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    impl SlowStore {
        fn new(hidden_for: u32) -> Self {
            Self {
                hidden_for,
                probes: AtomicU32::new(0),
                puts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StorageService for SlowStore {
        async fn put_object(&self, bucket: &str, key: &str, body: ByteStream) -> Result<()> {
            let data = body
                .collect()
                .await
                .map_err(|e| IngestError::Storage(e.to_string()))?
                .into_bytes()
                .to_vec();
            self.puts
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string(), data));
            Ok(())
        }

        async fn object_exists(&self, _bucket: &str, _key: &str) -> Result<bool> {
            let seen = self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(seen >= self.hidden_for)
        }
    }

    fn fast_policy(max_attempts: u32) -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_put_bytes_waits_for_visibility() {
        let store = SlowStore::new(2);
        let handle = ObjectHandle::new(&store, "my-bucket", "data/a.txt")
            .with_wait_policy(fast_policy(5));

        let size = handle.put(b"hello".to_vec()).await.unwrap();

        assert_eq!(size, 5);
        assert_eq!(store.probes.load(Ordering::SeqCst), 3);
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts[0].0, "my-bucket");
        assert_eq!(puts[0].1, "data/a.txt");
        assert_eq!(puts[0].2, b"hello");
    }

    #[tokio::test]
    async fn test_wait_gives_up_after_max_attempts() {
        let store = SlowStore::new(u32::MAX);
        let handle =
            ObjectHandle::new(&store, "b", "k").with_wait_policy(fast_policy(3));

        let err = handle.put(Bytes::from_static(b"x")).await.unwrap_err();

        assert!(matches!(err, IngestError::Storage(_)));
        assert_eq!(store.probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_argument_without_network_call() {
        let store = SlowStore::new(0);
        let handle = ObjectHandle::new(&store, "b", "k");

        let err = handle.put("definitely/not/a/real/file.bin").await.unwrap_err();

        assert!(matches!(err, IngestError::InvalidArgument(_)));
        assert!(store.puts.lock().unwrap().is_empty());
        assert_eq!(store.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_put_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlowStore::new(0);
        let handle = ObjectHandle::new(&store, "b", "k");

        let err = handle.put(dir.path()).await.unwrap_err();

        assert!(matches!(err, IngestError::InvalidArgument(_)));
        assert!(store.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_file_streams_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"file body").unwrap();
        let store = SlowStore::new(0);
        let handle = ObjectHandle::new(&store, "b", "data/a.txt");

        let size = handle.put(path.as_path()).await.unwrap();

        assert_eq!(size, 9);
        assert_eq!(store.puts.lock().unwrap()[0].2, b"file body");
    }
}
