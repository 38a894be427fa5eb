#![allow(dead_code)]

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use mlhub_ingest::models::{Asset, CollectionRef, CollectionType, Dataset, Item};
use mlhub_ingest::services::catalog::CatalogClient;
use mlhub_ingest::services::object::WaitPolicy;
use mlhub_ingest::services::storage::StorageService;
use mlhub_ingest::{IngestError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory object store keyed by (bucket, key).
pub struct MockStorageService {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    attempts: Mutex<Vec<String>>,
    /// 1-based index of the put that is rejected
    fail_on: Option<usize>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(nth: usize) -> Self {
        Self {
            fail_on: Some(nth),
            ..Self::new()
        }
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn attempted_puts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn put_object(&self, bucket: &str, key: &str, body: ByteStream) -> Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(key.to_string());
            attempts.len()
        };
        if self.fail_on == Some(attempt) {
            return Err(IngestError::Storage(format!("AccessDenied for {}/{}", bucket, key)));
        }

        let data = body
            .collect()
            .await
            .map_err(|e| IngestError::Storage(e.to_string()))?
            .into_bytes()
            .to_vec();
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string())))
    }
}

/// Catalog that serves a fixed dataset and writes pre-built archives.
pub struct FakeCatalog {
    pub dataset: Dataset,
    pub items: HashMap<String, Vec<Item>>,
    /// collection id -> files packed into that collection's archive
    pub archives: HashMap<String, Vec<(String, Vec<u8>)>>,
    pub downloads: Mutex<Vec<String>>,
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        Ok(vec![self.dataset.clone()])
    }

    async fn fetch_dataset(&self, dataset_id: &str) -> Result<Dataset> {
        if dataset_id == self.dataset.id {
            Ok(self.dataset.clone())
        } else {
            Err(IngestError::Catalog(format!("GET /datasets/{} returned 404 Not Found", dataset_id)))
        }
    }

    async fn list_collection_items(&self, collection_id: &str, limit: usize) -> Result<Vec<Item>> {
        Ok(self
            .items
            .get(collection_id)
            .map(|items| items.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn download_archives(
        &self,
        dataset: &Dataset,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for collection in &dataset.collections {
            let files = self.archives.get(&collection.id).cloned().unwrap_or_default();
            let path = output_dir.join(format!("{}.tar.gz", collection.id));
            write_tar_gz(&path, &files);
            self.downloads.lock().unwrap().push(collection.id.clone());
            paths.push(path);
        }
        Ok(paths)
    }
}

pub fn write_tar_gz(path: &Path, files: &[(String, Vec<u8>)]) {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_slice()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

pub fn storm_dataset() -> FakeCatalog {
    let dataset = Dataset {
        id: "nasa_tropical_storm_competition".to_string(),
        title: Some("Tropical Cyclone Wind Estimation Competition".to_string()),
        collections: vec![
            CollectionRef {
                id: "storm_train_source".to_string(),
                types: vec![CollectionType::SourceImagery],
            },
            CollectionRef {
                id: "storm_train_labels".to_string(),
                types: vec![CollectionType::Labels],
            },
        ],
    };

    let mut assets = BTreeMap::new();
    assets.insert(
        "image".to_string(),
        Asset {
            title: Some("Satellite image".to_string()),
            media_type: Some("image/jpeg".to_string()),
            href: None,
        },
    );
    let item = Item {
        id: "storm_train_source_abs_000".to_string(),
        collection: Some("storm_train_source".to_string()),
        assets,
    };

    let mut items = HashMap::new();
    items.insert("storm_train_source".to_string(), vec![item]);

    let mut archives = HashMap::new();
    archives.insert(
        "storm_train_source".to_string(),
        vec![(
            "storm_train_source/abs_000/image.jpg".to_string(),
            b"jpeg bytes".to_vec(),
        )],
    );
    archives.insert(
        "storm_train_labels".to_string(),
        vec![(
            "storm_train_labels/abs_000/labels.json".to_string(),
            br#"{"wind_speed": "43"}"#.to_vec(),
        )],
    );

    FakeCatalog {
        dataset,
        items,
        archives,
        downloads: Mutex::new(Vec::new()),
    }
}

pub fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 2,
    }
}
