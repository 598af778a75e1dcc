use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use thiserror::Error;

use crate::config::S3Config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Problem with file upload")]
    Io(#[from] std::io::Error),
    #[error("Problem with file upload")]
    Remote(String),
    #[error("Invalid file name")]
    InvalidName,
}

/// StorageService
///
/// Where bootcamp photos are written. Handlers only see this trait, so the disk
/// backend, the S3 backend and the in-memory mock are interchangeable.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Prepares the backend at startup (creates the upload directory or bucket).
    async fn ensure_ready(&self) -> Result<(), StorageError>;

    /// Persists `bytes` under `name` and returns the stored name.
    async fn save(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;
}

/// sanitize_key
///
/// Strips directory navigation (`..`, `.`) and empty segments from a key so a
/// crafted name can never escape the upload root.
pub fn sanitize_key(key: &str) -> String {
    key.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn checked_key(name: &str) -> Result<String, StorageError> {
    let key = sanitize_key(name);
    if key.is_empty() {
        return Err(StorageError::InvalidName);
    }
    Ok(key)
}

// --- Disk ---

/// LocalDiskStorage
///
/// Writes files under a root directory that is also served statically under `/uploads`.
#[derive(Clone, Debug)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn save(
        &self,
        name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let key = checked_key(name)?;
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("failed to write {}: {:?}", path.display(), e);
            StorageError::Io(e)
        })?;
        Ok(key)
    }
}

// --- S3 ---

/// S3StorageClient
///
/// Object storage through the AWS SDK. `force_path_style(true)` keeps it
/// compatible with MinIO and other S3-compatible gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub fn new(config: &S3Config) -> Self {
        let credentials = s3::config::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let sdk_config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .region(s3::config::Region::new(config.region.clone()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(sdk_config),
            bucket_name: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket fails when the bucket already exists; that is logged and ignored.
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket {}: {:?}", self.bucket_name, e);
        }
        Ok(())
    }

    async fn save(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let key = checked_key(name)?;
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("put_object {} failed: {:?}", key, e);
                StorageError::Remote(e.to_string())
            })?;
        Ok(key)
    }
}

// --- Mock ---

/// MockStorageService
///
/// In-memory storage used by the handler tests. Records every saved name so tests
/// can assert on what reached the backend.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every save fails.
    pub should_fail: bool,
    saved: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn save(
        &self,
        name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Remote("simulated failure".to_string()));
        }
        let key = checked_key(name)?;
        if let Ok(mut saved) = self.saved.lock() {
            saved.push(key.clone());
        }
        Ok(key)
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
