use std::sync::Arc;

use actix_web::web;

use crate::auth::TokenKeys;
use crate::db::DocumentStore;
use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::services::{AuthService, ProductService};

/// Shared handles every worker's `App` is built from.
///
/// Each field is already wrapped in `web::Data`, so cloning the state for a
/// new worker only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub products: web::Data<ProductService>,
    pub auth: web::Data<AuthService>,
    pub tokens: web::Data<TokenKeys>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenKeys, hash_cost: u32) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            products: web::Data::new(ProductService::new(store.clone())),
            auth: web::Data::new(AuthService::new(store, tokens.clone(), hash_cost)),
            tokens: web::Data::from(tokens),
        }
    }

    /// Registers the services, token keys and extractor error handlers.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.products.clone())
            .app_data(self.auth.clone())
            .app_data(self.tokens.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler));
    }
}
