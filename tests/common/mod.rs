#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use dropbox_clone_server::{
    auth::{Claims, IdentityVerifier, WebhookVerifier},
    config::{Config, IdentityConfig, StorageBackend, StorageConfig},
    create_app,
    database::Repository,
    errors::{AppError, Result},
    handlers::AppState,
    models::{File, Folder, FolderChanges, NewFile, NewFolder, User},
    storage::{Storage, StoredObject},
};

pub const JWT_SECRET: &str = "test-identity-secret";
pub const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

fn database_down() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    folders: Vec<Folder>,
    files: Vec<File>,
}

/// In-memory stand-in for Postgres. Counts every call so tests can assert
/// that a request never reached the store.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
    writes: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn folders(&self) -> Vec<Folder> {
        self.tables.lock().unwrap().folders.clone()
    }

    pub fn files(&self) -> Vec<File> {
        self.tables.lock().unwrap().files.clone()
    }

    pub fn insert_user(&self, external_id: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            email: format!("{}@example.com", external_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn insert_folder(&self, owner: &User, name: &str, parent: Option<Uuid>) -> Folder {
        let folder = Folder {
            id: Uuid::new_v4(),
            user_id: owner.id,
            name: name.to_string(),
            parent_folder_id: parent,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().folders.push(folder.clone());
        folder
    }

    fn read(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(database_down());
        }
        Ok(())
    }

    fn write(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(database_down());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        self.read()
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User> {
        self.write()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.external_id == external_id) {
            user.email = email.to_string();
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }
        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_folder(&self, id: Uuid) -> Result<Option<Folder>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.folders.iter().find(|f| f.id == id).cloned())
    }

    async fn list_folders(&self, user_id: Uuid, parent_folder_id: Option<Uuid>) -> Result<Vec<Folder>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        let mut folders: Vec<Folder> = tables
            .folders
            .iter()
            .filter(|f| f.user_id == user_id && f.parent_folder_id == parent_folder_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn create_folder(&self, folder: &NewFolder) -> Result<Folder> {
        self.write()?;
        let created = Folder {
            id: Uuid::new_v4(),
            user_id: folder.user_id,
            name: folder.name.clone(),
            parent_folder_id: folder.parent_folder_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().folders.push(created.clone());
        Ok(created)
    }

    async fn update_folder(&self, id: Uuid, changes: &FolderChanges) -> Result<Option<Folder>> {
        self.write()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(folder) = tables.folders.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            folder.name = name.clone();
        }
        if let Some(parent) = changes.parent_folder_id {
            folder.parent_folder_id = parent;
        }
        folder.updated_at = Utc::now();
        Ok(Some(folder.clone()))
    }

    async fn delete_folder(&self, id: Uuid) -> Result<bool> {
        self.write()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.folders.len();
        tables.folders.retain(|f| f.id != id);
        Ok(tables.folders.len() < before)
    }

    async fn folder_has_children(&self, id: Uuid) -> Result<bool> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.folders.iter().any(|f| f.parent_folder_id == Some(id))
            || tables.files.iter().any(|f| f.folder_id == Some(id)))
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<File>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.files.iter().find(|f| f.id == id).cloned())
    }

    async fn list_files(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<File>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .files
            .iter()
            .filter(|f| f.user_id == user_id && f.folder_id == folder_id)
            .cloned()
            .collect())
    }

    async fn create_file(&self, file: &NewFile) -> Result<File> {
        self.write()?;
        let created = File {
            id: Uuid::new_v4(),
            user_id: file.user_id,
            folder_id: file.folder_id,
            name: file.name.clone(),
            storage_key: file.storage_key.clone(),
            url: file.url.clone(),
            size_bytes: file.size_bytes,
            content_type: file.content_type.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().files.push(created.clone());
        Ok(created)
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool> {
        self.write()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.files.len();
        tables.files.retain(|f| f.id != id);
        Ok(tables.files.len() < before)
    }
}

/// Object store held in memory.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<StoredObject> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::Storage("bucket unreachable".to_string()));
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("https://files.test/{}", key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<MemoryRepository>,
    pub storage: Arc<MemoryStorage>,
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgresql://unused".to_string(),
        database_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        max_file_size: 1024,
        identity: IdentityConfig {
            jwt_secret: Some(JWT_SECRET.to_string()),
            jwt_public_key: None,
            issuer: None,
        },
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        storage: StorageConfig {
            backend: StorageBackend::S3,
            local_path: "./unused".to_string(),
            public_url: "https://files.test".to_string(),
            s3_bucket: Some("test-bucket".to_string()),
            s3_region: Some("us-east-1".to_string()),
            s3_endpoint: None,
        },
    }
}

pub fn test_app() -> TestApp {
    let repository = Arc::new(MemoryRepository::default());
    let storage = Arc::new(MemoryStorage::default());
    let state = AppState {
        repository: repository.clone(),
        storage: storage.clone(),
        identity: Arc::new(IdentityVerifier::from_secret(JWT_SECRET, None)),
        webhooks: Some(Arc::new(WebhookVerifier::new(WEBHOOK_SECRET).unwrap())),
        config: Arc::new(test_config()),
    };

    TestApp {
        router: create_app(state),
        repository,
        storage,
    }
}

pub fn token_for(external_id: &str) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: external_id.to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: Some(now.timestamp()),
        iss: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_ref())).unwrap()
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}
