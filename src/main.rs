use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dropbox_clone_server::{
    auth::{IdentityVerifier, WebhookVerifier},
    config::Config,
    create_app,
    database::Database,
    handlers::AppState,
    storage::create_storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dropbox_clone_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let database = Database::new(&config.database_url, config.database_max_connections)
        .await
        .context("failed to connect to database")?;
    database.migrate().await.context("failed to run migrations")?;
    tracing::info!("Database ready");

    let storage = create_storage(&config.storage)
        .await
        .context("failed to initialise storage")?;

    let identity = IdentityVerifier::from_config(&config.identity)
        .context("failed to initialise identity verification")?;

    let webhooks = match config.webhook_secret.as_deref() {
        Some(secret) => Some(Arc::new(
            WebhookVerifier::new(secret).context("failed to initialise webhook verification")?,
        )),
        None => {
            tracing::warn!("WEBHOOK_SECRET not set; identity webhooks will be rejected");
            None
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        repository: Arc::new(database),
        storage,
        identity: Arc::new(identity),
        webhooks,
        config: Arc::new(config),
    };

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
