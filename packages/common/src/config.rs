use std::path::PathBuf;

use serde::Deserialize;

/// Which blob store backend serves uploaded images.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// Connection settings for the `s3` backend.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    /// Region name. Default: "us-east-1".
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). Enables path-style addressing.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

/// App-level blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Prefix of every image URL handed out to clients.
    /// Default: "http://127.0.0.1:3000/api/v1/blobs".
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Largest accepted image in bytes. Default: 5 MiB.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}
fn default_base_path() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:3000/api/v1/blobs".into()
}
fn default_max_image_size() -> u64 {
    5 * 1024 * 1024
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            base_path: default_base_path(),
            public_base_url: default_public_base_url(),
            max_image_size: default_max_image_size(),
            s3: None,
        }
    }
}
