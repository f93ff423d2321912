use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose},
    Engine as _,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Repository;
use crate::errors::{AppError, Result};
use crate::models::{CreateFileRequest, DeleteFileRequest, File, NewFile};
use crate::services::folders::non_empty;
use crate::services::ownership::{OwnershipValidator, ResourceKind};
use crate::storage::Storage;
use crate::utils::file::{content_type_for, object_key};

pub struct FileService<'a> {
    repository: &'a dyn Repository,
    storage: &'a dyn Storage,
    max_file_size: usize,
}

impl<'a> FileService<'a> {
    pub fn new(repository: &'a dyn Repository, storage: &'a dyn Storage, max_file_size: usize) -> Self {
        Self {
            repository,
            storage,
            max_file_size,
        }
    }

    pub async fn create(&self, external_id: &str, request: CreateFileRequest) -> Result<File> {
        let (name, encoded) = match (
            non_empty(request.name.as_deref()),
            non_empty(request.file.as_deref()),
        ) {
            (Some(name), Some(encoded)) => (name.trim().to_string(), encoded),
            _ => {
                return Err(AppError::validation(
                    "File name and file content are required",
                ))
            }
        };

        let data = decode_payload(encoded)?;
        if data.is_empty() {
            return Err(AppError::validation("File name and file content are required"));
        }
        if data.len() > self.max_file_size {
            return Err(AppError::PayloadTooLarge);
        }

        let authorized = OwnershipValidator::new(self.repository)
            .authorize_folder(
                external_id,
                non_empty(request.folder_id.as_deref()),
                ResourceKind::Folder,
            )
            .await?;

        let key = object_key(external_id, &name, Utc::now(), Uuid::new_v4());
        let content_type = content_type_for(&name);
        let size_bytes = data.len() as i64;

        let stored = self.storage.put(&key, data, &content_type).await?;

        let new_file = NewFile {
            user_id: authorized.user.id,
            folder_id: authorized.resource.map(|folder| folder.id),
            name,
            storage_key: stored.key.clone(),
            url: stored.url,
            size_bytes,
            content_type,
        };

        match self.repository.create_file(&new_file).await {
            Ok(file) => {
                info!(
                    user_id = %file.user_id,
                    file_id = %file.id,
                    key = %file.storage_key,
                    size = file.size_bytes,
                    "File uploaded"
                );
                Ok(file)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(&stored.key).await {
                    warn!(key = %stored.key, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(err)
            }
        }
    }

    pub async fn list(&self, external_id: &str, folder_id: Option<&str>) -> Result<Vec<File>> {
        let authorized = OwnershipValidator::new(self.repository)
            .authorize_folder(external_id, non_empty(folder_id), ResourceKind::Folder)
            .await?;

        self.repository
            .list_files(authorized.user.id, authorized.resource.map(|folder| folder.id))
            .await
    }

    pub async fn delete(&self, external_id: &str, request: DeleteFileRequest) -> Result<()> {
        let file_id = non_empty(request.file_id.as_deref())
            .ok_or_else(|| AppError::validation("File ID is required"))?;

        let file = OwnershipValidator::new(self.repository)
            .authorize_file(external_id, file_id)
            .await?
            .into_resource()?;

        self.repository.delete_file(file.id).await?;

        if let Err(err) = self.storage.delete(&file.storage_key).await {
            warn!(file_id = %file.id, key = %file.storage_key, error = %err, "Failed to delete stored object");
        }

        info!(user_id = %file.user_id, file_id = %file.id, "File deleted");

        Ok(())
    }
}

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Accepts plain base64 or a `data:<mime>;base64,` URL. Line breaks, missing
/// padding and the URL-safe alphabet are tolerated.
fn decode_payload(encoded: &str) -> Result<Vec<u8>> {
    let encoded = encoded.trim();
    let encoded = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    let normalized: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    LENIENT
        .decode(normalized)
        .map_err(|_| AppError::validation("File content must be base64 encoded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_and_data_url() {
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_payload("data:text/plain;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_decode_tolerates_loose_encodings() {
        assert_eq!(decode_payload("aGVsbG8").unwrap(), b"hello");
        assert_eq!(decode_payload("aGVs\nbG8=\r\n").unwrap(), b"hello");
        assert_eq!(decode_payload("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_payload("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_payload("not base64!!").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == "File content must be base64 encoded"));
    }
}
