//! Business operations shared by the HTTP handlers.

pub mod auth;
pub mod product;

pub use auth::AuthService;
pub use product::ProductService;
