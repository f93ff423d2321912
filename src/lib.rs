pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::StorageBackend;
use crate::handlers::{docs, files, folders, health, webhooks, AppState};

pub fn create_app(state: AppState) -> Router {
    let max_request_size = state.config.max_request_size();

    let mut app = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/folders",
            post(folders::create_folder)
                .get(folders::get_folders)
                .put(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route(
            "/files",
            post(files::create_file)
                .get(files::list_files)
                .delete(files::delete_file),
        )
        .route("/webhooks", post(webhooks::identity_webhook))
        .merge(docs::create_docs_router());

    if state.config.storage.backend == StorageBackend::Local {
        let root = Path::new(&state.config.storage.local_path).to_path_buf();
        app = app.nest_service("/objects", ServeDir::new(root));
    }

    app.layer(DefaultBodyLimit::max(max_request_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
