use tracing::info;
use uuid::Uuid;

use crate::database::Repository;
use crate::errors::{AppError, Result};
use crate::models::{
    CreateFolderRequest, DeleteFolderRequest, Folder, FolderChanges, NewFolder, UpdateFolderRequest,
};
use crate::services::ownership::{OwnershipError, OwnershipValidator, ResourceKind};

/// Upper bound on ancestor walks; deeper chains are treated as corrupt.
pub const MAX_FOLDER_DEPTH: usize = 256;

pub struct FolderService<'a> {
    repository: &'a dyn Repository,
}

impl<'a> FolderService<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        Self { repository }
    }

    fn validator(&self) -> OwnershipValidator<'a> {
        OwnershipValidator::new(self.repository)
    }

    pub async fn create(&self, external_id: &str, request: CreateFolderRequest) -> Result<Folder> {
        let name = required_name(request.name.as_deref())?;
        let parent = non_empty(request.parent_folder.as_deref());

        let authorized = self
            .validator()
            .authorize_folder(external_id, parent, ResourceKind::ParentFolder)
            .await?;

        let folder = self
            .repository
            .create_folder(&NewFolder {
                user_id: authorized.user.id,
                name,
                parent_folder_id: authorized.resource.map(|parent| parent.id),
            })
            .await?;

        info!(
            user_id = %folder.user_id,
            folder_id = %folder.id,
            parent_folder_id = ?folder.parent_folder_id,
            "Folder created"
        );

        Ok(folder)
    }

    pub async fn get(&self, external_id: &str, folder_id: &str) -> Result<Folder> {
        let authorized = self
            .validator()
            .authorize_folder(external_id, Some(folder_id), ResourceKind::Folder)
            .await?;

        authorized.into_resource()
    }

    pub async fn list(&self, external_id: &str, parent_folder: Option<&str>) -> Result<Vec<Folder>> {
        let authorized = self
            .validator()
            .authorize_folder(external_id, non_empty(parent_folder), ResourceKind::ParentFolder)
            .await?;

        self.repository
            .list_folders(authorized.user.id, authorized.resource.map(|parent| parent.id))
            .await
    }

    pub async fn update(&self, external_id: &str, request: UpdateFolderRequest) -> Result<Folder> {
        let folder_id = non_empty(request.folder_id.as_deref())
            .ok_or_else(|| AppError::validation("Folder ID is required"))?;
        let name = match request.name.as_deref() {
            Some(name) => Some(required_name(Some(name))?),
            None => None,
        };

        let validator = self.validator();
        let authorized = validator
            .authorize_folder(external_id, Some(folder_id), ResourceKind::Folder)
            .await?;
        let user = authorized.user.clone();
        let folder = authorized.into_resource()?;

        let parent_folder_id = match request.parent_folder {
            None => None,
            Some(new_parent) => match non_empty(new_parent.as_deref()) {
                None => Some(None),
                Some(parent_id) => {
                    let parent = validator
                        .authorize_folder(&user.external_id, Some(parent_id), ResourceKind::ParentFolder)
                        .await?
                        .into_resource()?;
                    self.ensure_not_descendant(folder.id, parent.id).await?;
                    Some(Some(parent.id))
                }
            },
        };

        let changes = FolderChanges {
            name,
            parent_folder_id,
        };
        let updated = self
            .repository
            .update_folder(folder.id, &changes)
            .await?
            .ok_or(OwnershipError::ResourceNotFound(ResourceKind::Folder))?;

        info!(user_id = %user.id, folder_id = %updated.id, "Folder updated");

        Ok(updated)
    }

    pub async fn delete(&self, external_id: &str, request: DeleteFolderRequest) -> Result<()> {
        let folder_id = non_empty(request.folder_id.as_deref())
            .ok_or_else(|| AppError::validation("Folder ID is required"))?;

        let authorized = self
            .validator()
            .authorize_folder(external_id, Some(folder_id), ResourceKind::Folder)
            .await?;
        let user_id = authorized.user.id;
        let folder = authorized.into_resource()?;

        if self.repository.folder_has_children(folder.id).await? {
            return Err(AppError::Conflict("Folder is not empty".to_string()));
        }

        self.repository.delete_folder(folder.id).await?;

        info!(user_id = %user_id, folder_id = %folder.id, "Folder deleted");

        Ok(())
    }

    async fn ensure_not_descendant(&self, folder_id: Uuid, new_parent_id: Uuid) -> Result<()> {
        let mut current = Some(new_parent_id);
        for _ in 0..MAX_FOLDER_DEPTH {
            let Some(id) = current else {
                return Ok(());
            };
            if id == folder_id {
                return Err(AppError::validation(
                    "Cannot move a folder into itself or one of its descendants",
                ));
            }
            current = match self.repository.find_folder(id).await? {
                Some(ancestor) => ancestor.parent_folder_id,
                None => None,
            };
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "folder ancestry of {} exceeds {} levels",
            new_parent_id,
            MAX_FOLDER_DEPTH
        )))
    }
}

fn required_name(name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::validation("Folder name is required")),
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
