use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub identity: IdentityConfig,
    pub webhook_secret: Option<String>,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub jwt_secret: Option<String>,
    /// PEM encoded RSA public key. Takes precedence over `jwt_secret`.
    pub jwt_public_key: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
    pub public_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let identity = IdentityConfig {
            jwt_secret: env::var("IDENTITY_JWT_SECRET").ok(),
            jwt_public_key: env::var("IDENTITY_JWT_PUBLIC_KEY").ok(),
            issuer: env::var("IDENTITY_ISSUER").ok(),
        };
        if identity.jwt_secret.is_none() && identity.jwt_public_key.is_none() {
            bail!("either IDENTITY_JWT_SECRET or IDENTITY_JWT_PUBLIC_KEY must be set");
        }

        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3,
            other => bail!("unsupported STORAGE_BACKEND: {}", other),
        };

        let storage = StorageConfig {
            backend,
            local_path: env::var("STORAGE_LOCAL_PATH")
                .unwrap_or_else(|_| "./uploads".to_string()),
            public_url: env::var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000/objects".to_string()),
            s3_bucket: env::var("AWS_S3_BUCKET_NAME").ok(),
            s3_region: env::var("AWS_REGION").ok(),
            s3_endpoint: env::var("AWS_S3_ENDPOINT").ok(),
        };
        if storage.backend == StorageBackend::S3 && storage.s3_bucket.is_none() {
            bail!("AWS_S3_BUCKET_NAME is required for the s3 storage backend");
        }

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/dropbox_clone".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT")?,
            max_file_size: env::var("MAX_FILE_SIZE")
                .unwrap_or_else(|_| "26214400".to_string()) // 25MB
                .parse()
                .context("MAX_FILE_SIZE")?,
            identity,
            webhook_secret: env::var("WEBHOOK_SECRET").ok(),
            storage,
        })
    }

    pub fn max_request_size(&self) -> usize {
        self.max_file_size / 3 * 4 + 64 * 1024
    }
}
