pub mod files;
pub mod folders;
pub mod ownership;
pub mod users;

pub use files::FileService;
pub use folders::FolderService;
pub use ownership::{OwnershipError, OwnershipValidator, ResourceKind};
pub use users::UserService;
