use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, primitives::ByteStream, types::ObjectCannedAcl, Client};

use crate::{
    errors::{AppError, Result},
    storage::{validate_key, Storage, StoredObject},
};

pub struct S3Storage {
    client: Client,
    bucket: String,
    region: Option<String>,
    endpoint: Option<String>,
}

impl S3Storage {
    pub async fn new(bucket: String, region: Option<String>, endpoint: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        tracing::info!(bucket = %bucket, region = ?region, endpoint = ?endpoint, "S3 storage initialised");

        Self {
            client,
            bucket,
            region,
            endpoint,
        }
    }

    fn object_url(&self, key: &str) -> String {
        match (&self.endpoint, &self.region) {
            (Some(endpoint), _) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            (None, Some(region)) => {
                format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, region, key)
            }
            (None, None) => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        validate_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload {}: {}", key, e)))?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.object_url(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete {}: {}", key, e)))?;

        Ok(())
    }
}
