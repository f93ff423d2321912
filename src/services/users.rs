use serde::Deserialize;
use tracing::info;

use crate::database::Repository;
use crate::errors::{AppError, Result};
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct IdentityUserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    pub primary_email_address_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub id: Option<String>,
    pub email_address: String,
}

impl IdentityUserData {
    pub fn email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref().and_then(|primary_id| {
            self.email_addresses
                .iter()
                .find(|address| address.id.as_deref() == Some(primary_id))
        });

        primary
            .or_else(|| self.email_addresses.first())
            .map(|address| address.email_address.trim())
            .filter(|email| !email.is_empty())
    }
}

pub struct UserService<'a> {
    repository: &'a dyn Repository,
}

impl<'a> UserService<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        Self { repository }
    }

    pub async fn apply_event(&self, event: IdentityEvent) -> Result<User> {
        match event.event_type.as_str() {
            "user.created" | "user.updated" => {}
            other => {
                tracing::debug!(event_type = other, "Ignoring identity event");
                return Err(AppError::Webhook("Unhandled event type".to_string()));
            }
        }

        let data: IdentityUserData = serde_json::from_value(event.data)
            .map_err(|_| AppError::Webhook("Invalid event payload".to_string()))?;
        let email = data
            .email()
            .ok_or_else(|| AppError::Webhook("Email is required".to_string()))?;

        let user = self.repository.upsert_user(&data.id, email).await?;

        info!(
            user_id = %user.id,
            external_id = %user.external_id,
            event_type = %event.event_type,
            "User synchronised from identity provider"
        );

        Ok(user)
    }
}
