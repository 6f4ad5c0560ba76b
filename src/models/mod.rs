pub mod product;
pub mod user;

pub use product::{Product, ProductInput, ProductPatch, ProductQuery, ProductResponse};
pub use user::{PublicUser, User};
