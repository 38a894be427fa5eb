use crate::error::{IngestError, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

/// Narrow view of an object store: a single put and an existence probe.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: ByteStream) -> Result<()>;
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

pub struct S3StorageService {
    client: Client,
}

impl S3StorageService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object(&self, bucket: &str, key: &str, body: ByteStream) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                IngestError::Storage(format!(
                    "put_object failed for {}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(IngestError::Storage(format!(
                        "head_object failed for {}/{}: {}",
                        bucket,
                        key,
                        DisplayErrorContext(&service_error)
                    )))
                }
            }
        }
    }
}
