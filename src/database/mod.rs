use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{File, Folder, FolderChanges, NewFile, NewFolder, User};

pub mod queries;

use queries::{FileQueries, FolderQueries, UserQueries};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>>;
    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User>;

    async fn find_folder(&self, id: Uuid) -> Result<Option<Folder>>;
    async fn list_folders(&self, user_id: Uuid, parent_folder_id: Option<Uuid>) -> Result<Vec<Folder>>;
    async fn create_folder(&self, folder: &NewFolder) -> Result<Folder>;
    async fn update_folder(&self, id: Uuid, changes: &FolderChanges) -> Result<Option<Folder>>;
    async fn delete_folder(&self, id: Uuid) -> Result<bool>;
    /// True when the folder holds sub-folders or files.
    async fn folder_has_children(&self, id: Uuid) -> Result<bool>;

    async fn find_file(&self, id: Uuid) -> Result<Option<File>>;
    async fn list_files(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<File>>;
    async fn create_file(&self, file: &NewFile) -> Result<File>;
    async fn delete_file(&self, id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("migration failed: {}", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        UserQueries::find_by_external_id(&self.pool, external_id).await
    }

    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User> {
        UserQueries::upsert(&self.pool, external_id, email).await
    }

    async fn find_folder(&self, id: Uuid) -> Result<Option<Folder>> {
        FolderQueries::find_by_id(&self.pool, id).await
    }

    async fn list_folders(&self, user_id: Uuid, parent_folder_id: Option<Uuid>) -> Result<Vec<Folder>> {
        FolderQueries::list(&self.pool, user_id, parent_folder_id).await
    }

    async fn create_folder(&self, folder: &NewFolder) -> Result<Folder> {
        FolderQueries::create(&self.pool, folder).await
    }

    async fn update_folder(&self, id: Uuid, changes: &FolderChanges) -> Result<Option<Folder>> {
        FolderQueries::update(&self.pool, id, changes).await
    }

    async fn delete_folder(&self, id: Uuid) -> Result<bool> {
        FolderQueries::delete(&self.pool, id).await
    }

    async fn folder_has_children(&self, id: Uuid) -> Result<bool> {
        FolderQueries::has_children(&self.pool, id).await
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<File>> {
        FileQueries::find_by_id(&self.pool, id).await
    }

    async fn list_files(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<File>> {
        FileQueries::list(&self.pool, user_id, folder_id).await
    }

    async fn create_file(&self, file: &NewFile) -> Result<File> {
        FileQueries::create(&self.pool, file).await
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool> {
        FileQueries::delete(&self.pool, id).await
    }
}
