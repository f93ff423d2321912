use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{AppError, Result};

pub mod local;
pub mod s3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<StoredObject>;

    async fn delete(&self, key: &str) -> Result<()>;
}

pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Local => {
            let storage = local::LocalStorage::new(&config.local_path, &config.public_url)?;
            Ok(Arc::new(storage))
        }
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| AppError::Storage("S3 bucket is not configured".to_string()))?;
            let storage = s3::S3Storage::new(
                bucket,
                config.s3_region.clone(),
                config.s3_endpoint.clone(),
            )
            .await;
            Ok(Arc::new(storage))
        }
    }
}

/// Object keys are relative, slash separated and never climb out of their root.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(AppError::Storage(format!("Invalid object key: {}", key)));
    }
    Ok(())
}
