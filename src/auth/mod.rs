pub mod jwt;
pub mod webhook;

pub use jwt::*;
pub use webhook::*;
