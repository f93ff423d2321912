use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreateFileRequest, DeleteFileRequest, File, FileQuery, MessageResponse},
    services::FileService,
};

fn service(state: &AppState) -> FileService<'_> {
    FileService::new(
        state.repository.as_ref(),
        state.storage.as_ref(),
        state.config.max_file_size,
    )
}

#[utoipa::path(
    post,
    path = "/files",
    request_body = CreateFileRequest,
    responses(
        (status = 201, description = "File uploaded", body = File),
        (status = 400, description = "Name or content missing"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or folder not found"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Upload or database failure")
    ),
    tag = "files"
)]
pub async fn create_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: std::result::Result<Json<CreateFileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<File>)> {
    let Json(request) = payload?;

    let file = service(&state).create(&user.external_id, request).await?;

    Ok((StatusCode::CREATED, Json(file)))
}

#[utoipa::path(
    get,
    path = "/files",
    params(FileQuery),
    responses(
        (status = 200, description = "Files in the folder", body = [File]),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Folder not found")
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<FileQuery>,
) -> Result<Json<Vec<File>>> {
    let files = service(&state)
        .list(&user.external_id, query.folder_id.as_deref())
        .await?;

    Ok(Json(files))
}

#[utoipa::path(
    delete,
    path = "/files",
    request_body = DeleteFileRequest,
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: std::result::Result<Json<DeleteFileRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload?;

    service(&state).delete(&user.external_id, request).await?;

    Ok(Json(MessageResponse::new("File deleted successfully")))
}
