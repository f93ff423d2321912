use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::folders::create_folder,
        crate::handlers::folders::get_folders,
        crate::handlers::folders::update_folder,
        crate::handlers::folders::delete_folder,
        crate::handlers::files::create_file,
        crate::handlers::files::list_files,
        crate::handlers::files::delete_file,
        crate::handlers::webhooks::identity_webhook,
    ),
    components(
        schemas(
            crate::models::Folder,
            crate::models::File,
            crate::models::User,
            crate::models::CreateFolderRequest,
            crate::models::UpdateFolderRequest,
            crate::models::DeleteFolderRequest,
            crate::models::CreateFileRequest,
            crate::models::DeleteFileRequest,
            crate::models::MessageResponse,
        )
    ),
    tags(
        (name = "folders", description = "Folder hierarchy management"),
        (name = "files", description = "File upload and storage"),
        (name = "webhooks", description = "Identity provider events")
    ),
    info(
        title = "Dropbox Clone API",
        version = "0.1.0",
        description = "Folder and file storage backed by Postgres and object storage"
    )
)]
pub struct ApiDoc;

pub fn create_docs_router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
