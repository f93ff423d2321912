use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub parent_folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub user_id: Uuid,
    pub name: String,
    pub parent_folder_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct FolderChanges {
    pub name: Option<String>,
    /// `Some(None)` moves the folder to the root.
    pub parent_folder_id: Option<Option<Uuid>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: Option<String>,
    pub parent_folder: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    pub folder_id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub parent_folder: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderRequest {
    pub folder_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FolderQuery {
    pub folder_id: Option<String>,
    pub parent_folder: Option<String>,
}
