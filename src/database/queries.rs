use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::*;

const USER_COLUMNS: &str = "id, external_id, email, created_at, updated_at";
const FOLDER_COLUMNS: &str = "id, user_id, name, parent_folder_id, created_at, updated_at";
const FILE_COLUMNS: &str =
    "id, user_id, folder_id, name, storage_key, url, size_bytes, content_type, created_at";

pub struct UserQueries;

impl UserQueries {
    pub async fn find_by_external_id(pool: &PgPool, external_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn upsert(pool: &PgPool, external_id: &str, email: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (external_id, email)
            VALUES ($1, $2)
            ON CONFLICT (external_id)
            DO UPDATE SET email = EXCLUDED.email, updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(external_id)
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}

pub struct FolderQueries;

impl FolderQueries {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(folder)
    }

    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        parent_folder_id: Option<Uuid>,
    ) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            r#"
            SELECT {FOLDER_COLUMNS} FROM folders
            WHERE user_id = $1 AND parent_folder_id IS NOT DISTINCT FROM $2
            ORDER BY name, created_at
            "#
        ))
        .bind(user_id)
        .bind(parent_folder_id)
        .fetch_all(pool)
        .await?;

        Ok(folders)
    }

    pub async fn create(pool: &PgPool, folder: &NewFolder) -> Result<Folder> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            r#"
            INSERT INTO folders (user_id, name, parent_folder_id)
            VALUES ($1, $2, $3)
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(folder.user_id)
        .bind(&folder.name)
        .bind(folder.parent_folder_id)
        .fetch_one(pool)
        .await?;

        Ok(folder)
    }

    pub async fn update(pool: &PgPool, id: Uuid, changes: &FolderChanges) -> Result<Option<Folder>> {
        // $3 flags whether the parent column is being written at all, so that
        // "move to root" (NULL) and "leave unchanged" stay distinguishable.
        let folder = sqlx::query_as::<_, Folder>(&format!(
            r#"
            UPDATE folders
            SET name = COALESCE($2, name),
                parent_folder_id = CASE WHEN $3 THEN $4 ELSE parent_folder_id END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.parent_folder_id.is_some())
        .bind(changes.parent_folder_id.flatten())
        .fetch_optional(pool)
        .await?;

        Ok(folder)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn has_children(pool: &PgPool, id: Uuid) -> Result<bool> {
        let has_children: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM folders WHERE parent_folder_id = $1)
                OR EXISTS (SELECT 1 FROM files WHERE folder_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(has_children)
    }
}

pub struct FileQueries;

impl FileQueries {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(file)
    }

    pub async fn list(pool: &PgPool, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(&format!(
            r#"
            SELECT {FILE_COLUMNS} FROM files
            WHERE user_id = $1 AND folder_id IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(pool)
        .await?;

        Ok(files)
    }

    pub async fn create(pool: &PgPool, file: &NewFile) -> Result<File> {
        let file = sqlx::query_as::<_, File>(&format!(
            r#"
            INSERT INTO files (user_id, folder_id, name, storage_key, url, size_bytes, content_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(file.user_id)
        .bind(file.folder_id)
        .bind(&file.name)
        .bind(&file.storage_key)
        .bind(&file.url)
        .bind(file.size_bytes)
        .bind(&file.content_type)
        .fetch_one(pool)
        .await?;

        Ok(file)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
