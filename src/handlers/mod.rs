use std::sync::Arc;

use crate::{
    auth::{IdentityVerifier, WebhookVerifier},
    config::Config,
    database::Repository,
    storage::Storage,
};

pub mod docs;
pub mod files;
pub mod folders;
pub mod health;
pub mod webhooks;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn Repository>,
    pub storage: Arc<dyn Storage>,
    pub identity: Arc<IdentityVerifier>,
    pub webhooks: Option<Arc<WebhookVerifier>>,
    pub config: Arc<Config>,
}
