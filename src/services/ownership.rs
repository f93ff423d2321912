use thiserror::Error;
use uuid::Uuid;

use crate::database::Repository;
use crate::errors::Result;
use crate::models::{File, Folder, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Folder,
    ParentFolder,
    File,
}

impl ResourceKind {
    fn not_found_message(self) -> &'static str {
        match self {
            ResourceKind::Folder => "Folder not found",
            ResourceKind::ParentFolder => "Parent folder not found",
            ResourceKind::File => "File not found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OwnershipError {
    #[error("user not found")]
    UserNotFound,
    #[error("{0:?} not found")]
    ResourceNotFound(ResourceKind),
    #[error("{0:?} is owned by another user")]
    ResourceNotOwned(ResourceKind),
}

impl OwnershipError {
    /// Caller-facing message. A foreign resource reads exactly like a
    /// missing one.
    pub fn message(&self) -> &'static str {
        match self {
            OwnershipError::UserNotFound => "User not found",
            OwnershipError::ResourceNotFound(kind) | OwnershipError::ResourceNotOwned(kind) => {
                kind.not_found_message()
            }
        }
    }
}

pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Folder {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for File {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct Authorized<T> {
    pub user: User,
    pub resource: Option<T>,
}

impl<T> Authorized<T> {
    pub fn into_resource(self) -> Result<T> {
        self.resource
            .ok_or_else(|| anyhow::anyhow!("ownership validated without a resource").into())
    }
}

pub struct OwnershipValidator<'a> {
    repository: &'a dyn Repository,
}

impl<'a> OwnershipValidator<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        Self { repository }
    }

    pub async fn resolve_user(&self, external_id: &str) -> Result<User> {
        self.repository
            .find_user_by_external_id(external_id)
            .await?
            .ok_or_else(|| OwnershipError::UserNotFound.into())
    }

    pub async fn authorize_folder(
        &self,
        external_id: &str,
        folder_id: Option<&str>,
        kind: ResourceKind,
    ) -> Result<Authorized<Folder>> {
        let user = self.resolve_user(external_id).await?;

        let Some(raw_id) = folder_id else {
            return Ok(Authorized { user, resource: None });
        };
        let id = parse_id(raw_id, kind)?;
        let folder = self.repository.find_folder(id).await?;
        let folder = check_owner(&user, folder, kind)?;

        Ok(Authorized {
            user,
            resource: Some(folder),
        })
    }

    pub async fn authorize_file(&self, external_id: &str, file_id: &str) -> Result<Authorized<File>> {
        let user = self.resolve_user(external_id).await?;

        let id = parse_id(file_id, ResourceKind::File)?;
        let file = self.repository.find_file(id).await?;
        let file = check_owner(&user, file, ResourceKind::File)?;

        Ok(Authorized {
            user,
            resource: Some(file),
        })
    }
}

pub fn parse_id(raw: &str, kind: ResourceKind) -> std::result::Result<Uuid, OwnershipError> {
    Uuid::parse_str(raw.trim()).map_err(|_| OwnershipError::ResourceNotFound(kind))
}

pub fn check_owner<T: Owned>(
    user: &User,
    resource: Option<T>,
    kind: ResourceKind,
) -> std::result::Result<T, OwnershipError> {
    let resource = resource.ok_or(OwnershipError::ResourceNotFound(kind))?;
    if resource.owner_id() != user.id {
        return Err(OwnershipError::ResourceNotOwned(kind));
    }
    Ok(resource)
}
