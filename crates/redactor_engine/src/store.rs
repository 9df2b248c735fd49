use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{services, ErrorKind, Operator};
use thiserror::Error;

use crate::body::ObjectBody;

/// How the production store reaches its object-storage service. Built once at
/// startup from validated configuration and passed in explicitly.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Any S3-compatible service (AWS S3, MinIO, R2, ...).
    S3 {
        /// Custom endpoint; `None` uses the service default for the region.
        endpoint: Option<String>,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
    /// A local directory tree, for development without a storage service.
    Fs { root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("storage service error: {0}")]
    Service(String),
}

impl StoreError {
    fn from_opendal(key: &str, err: opendal::Error) -> Self {
        if err.kind() == ErrorKind::NotFound {
            StoreError::NotFound {
                key: key.to_string(),
            }
        } else {
            StoreError::Service(err.to_string())
        }
    }
}

/// One bucket's worth of object storage, exposing the three operations the
/// workflow consumes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` unmodified under `key`, recording `content_type` where
    /// the backend supports it.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Whether an object exists under `key`. `Ok(false)` means confirmed
    /// absent; errors are service failures.
    async fn head(&self, key: &str) -> Result<bool, StoreError>;

    /// Fetch the object body under `key`.
    async fn get(&self, key: &str) -> Result<ObjectBody, StoreError>;
}

/// [`ObjectStore`] over an OpenDAL operator bound to a single bucket.
pub struct OpendalStore {
    op: Operator,
}

impl OpendalStore {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// Purely in-memory store; used by tests and ad-hoc tooling.
    pub fn memory() -> Result<Self, StoreError> {
        let op = Operator::new(services::Memory::default())
            .map_err(|err| StoreError::Service(err.to_string()))?
            .finish();
        Ok(Self { op })
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError> {
        // Not every backend records a content type (the fs service cannot);
        // only ask for one where the capability exists.
        let result = if self.op.info().full_capability().write_with_content_type {
            self.op
                .write_with(key, bytes)
                .content_type(content_type)
                .await
        } else {
            self.op.write(key, bytes).await
        };
        result.map_err(|err| StoreError::from_opendal(key, err))?;
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<bool, StoreError> {
        match self.op.stat(key).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::Service(err.to_string())),
        }
    }

    async fn get(&self, key: &str) -> Result<ObjectBody, StoreError> {
        let buffer = self
            .op
            .read(key)
            .await
            .map_err(|err| StoreError::from_opendal(key, err))?;
        Ok(ObjectBody::Bytes(buffer.to_bytes()))
    }
}

/// Open a store for `bucket` against the configured backend.
pub fn open_store(
    config: &StorageConfig,
    bucket: &str,
) -> Result<Arc<dyn ObjectStore>, StoreError> {
    let op = match config {
        StorageConfig::S3 {
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => {
            let mut builder = services::S3::default()
                .bucket(bucket)
                .region(region)
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key);
            if let Some(endpoint) = endpoint {
                builder = builder.endpoint(endpoint);
            }
            Operator::new(builder)
                .map_err(|err| StoreError::Service(err.to_string()))?
                .finish()
        }
        StorageConfig::Fs { root } => {
            let dir = root.join(bucket);
            std::fs::create_dir_all(&dir).map_err(|err| StoreError::Service(err.to_string()))?;
            let builder = services::Fs::default().root(&dir.to_string_lossy());
            Operator::new(builder)
                .map_err(|err| StoreError::Service(err.to_string()))?
                .finish()
        }
    };
    Ok(Arc::new(OpendalStore::new(op)))
}
