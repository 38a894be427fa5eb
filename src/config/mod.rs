use crate::error::{IngestError, Result};
use crate::services::object::WaitPolicy;
use crate::utils::keys::KeyScheme;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_DATASET_ID: &str = "nasa_tropical_storm_competition";
pub const DEFAULT_MLHUB_ROOT_URL: &str = "https://api.radiant.earth/mlhub/v1";

/// Catalog connection settings
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// API root (default: Radiant MLHub v1)
    pub root_url: Url,

    /// API key sent as the `key` query parameter
    pub api_key: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_url: Url::parse(DEFAULT_MLHUB_ROOT_URL).expect("default catalog URL is valid"),
            api_key: None,
        }
    }
}

/// Object storage settings. Without an endpoint the standard AWS provider
/// chain decides region and credentials.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// S3-compatible endpoint override, e.g. a local MinIO
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,

    /// Existence polling after each put
    pub wait: WaitPolicy,
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Target bucket (`AWS_BUCKET_NAME`)
    pub bucket: Option<String>,

    /// Dataset to ingest (default: nasa_tropical_storm_competition)
    pub dataset_id: String,

    /// Where archives are downloaded and extracted (default: ./data)
    pub download_dir: PathBuf,

    pub key_scheme: KeyScheme,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            download_dir: default_download_dir(),
            key_scheme: KeyScheme::default(),
            catalog: CatalogConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// The `data` directory at the crate root.
pub fn default_download_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

impl IngestConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let default = Self::default();
        let default_wait = WaitPolicy::default();

        let root_url = match get("MLHUB_ROOT_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| {
                IngestError::Config(format!("MLHUB_ROOT_URL '{}' is not a valid URL: {}", raw, e))
            })?,
            None => default.catalog.root_url,
        };

        let key_scheme = match get("UPLOAD_KEY_SCHEME") {
            Some(raw) => raw.parse()?,
            None => default.key_scheme,
        };

        Ok(Self {
            bucket: get("AWS_BUCKET_NAME"),

            dataset_id: get("MLHUB_DATASET_ID").unwrap_or(default.dataset_id),

            download_dir: get("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.download_dir),

            key_scheme,

            catalog: CatalogConfig {
                root_url,
                api_key: get("MLHUB_API_KEY"),
            },

            storage: StorageConfig {
                endpoint: get("S3_ENDPOINT"),
                access_key: get("S3_ACCESS_KEY"),
                secret_key: get("S3_SECRET_KEY"),
                region: get("S3_REGION"),
                wait: WaitPolicy {
                    interval: get("S3_WAIT_INTERVAL_SECS")
                        .and_then(|v| v.parse().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(default_wait.interval),
                    max_attempts: get("S3_WAIT_MAX_ATTEMPTS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(default_wait.max_attempts),
                },
            },
        })
    }

    /// The target bucket; required whenever an upload runs.
    pub fn bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| IngestError::Config("AWS_BUCKET_NAME must be set".to_string()))
    }
}
