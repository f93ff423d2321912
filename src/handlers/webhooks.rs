use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    auth::WebhookHeaders,
    errors::{AppError, Result},
    handlers::AppState,
    models::User,
    services::users::{IdentityEvent, UserService},
};

#[utoipa::path(
    post,
    path = "/webhooks",
    responses(
        (status = 201, description = "User created or updated", body = User),
        (status = 400, description = "Missing headers, bad signature or unhandled event"),
        (status = 500, description = "Webhook secret not configured")
    ),
    tag = "webhooks"
)]
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<User>)> {
    let verifier = state.webhooks.as_ref().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("WEBHOOK_SECRET is not configured"))
    })?;

    let webhook_headers = WebhookHeaders::from_headers(&headers)?;
    verifier.verify(&webhook_headers, &body)?;

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|_| AppError::Webhook("Invalid event payload".to_string()))?;

    let user = UserService::new(state.repository.as_ref())
        .apply_event(event)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
