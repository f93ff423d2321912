use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        CreateFolderRequest, DeleteFolderRequest, Folder, FolderQuery, MessageResponse,
        UpdateFolderRequest,
    },
    services::FolderService,
};

#[utoipa::path(
    post,
    path = "/folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = Folder),
        (status = 400, description = "Folder name missing"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or parent folder not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "folders"
)]
pub async fn create_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: std::result::Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Folder>)> {
    let Json(request) = payload?;

    let folder = FolderService::new(state.repository.as_ref())
        .create(&user.external_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(folder)))
}

#[utoipa::path(
    get,
    path = "/folders",
    params(FolderQuery),
    responses(
        (status = 200, description = "Folders under `parentFolder`, or the single folder named by `folderId`", body = [Folder]),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Folder not found")
    ),
    tag = "folders"
)]
pub async fn get_folders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<FolderQuery>,
) -> Result<Response> {
    let service = FolderService::new(state.repository.as_ref());

    match query.folder_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(folder_id) => {
            let folder = service.get(&user.external_id, folder_id).await?;
            Ok(Json(folder).into_response())
        }
        None => {
            let folders = service
                .list(&user.external_id, query.parent_folder.as_deref())
                .await?;
            Ok(Json(folders).into_response())
        }
    }
}

#[utoipa::path(
    put,
    path = "/folders",
    request_body = UpdateFolderRequest,
    responses(
        (status = 200, description = "Folder updated", body = Folder),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Folder or parent folder not found")
    ),
    tag = "folders"
)]
pub async fn update_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: std::result::Result<Json<UpdateFolderRequest>, JsonRejection>,
) -> Result<Json<Folder>> {
    let Json(request) = payload?;

    let folder = FolderService::new(state.repository.as_ref())
        .update(&user.external_id, request)
        .await?;

    Ok(Json(folder))
}

#[utoipa::path(
    delete,
    path = "/folders",
    request_body = DeleteFolderRequest,
    responses(
        (status = 200, description = "Folder deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Folder not found"),
        (status = 409, description = "Folder is not empty")
    ),
    tag = "folders"
)]
pub async fn delete_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: std::result::Result<Json<DeleteFolderRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload?;

    FolderService::new(state.repository.as_ref())
        .delete(&user.external_id, request)
        .await?;

    Ok(Json(MessageResponse::new("Folder deleted successfully")))
}
