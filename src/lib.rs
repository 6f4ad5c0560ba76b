#![doc = "The `catalog` library crate."]
#![doc = ""]
#![doc = "A product catalog REST backend: document storage behind a small gateway trait,"]
#![doc = "product and account services, bearer-token authorization with an admin gate,"]
#![doc = "and the actix-web routes that expose them. The binary (`main.rs`) wires these"]
#![doc = "together with configuration, logging and CORS."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use crate::error::AppError;
pub use crate::state::AppState;
