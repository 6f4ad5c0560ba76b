#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{body::MessageBody, dev::ServiceResponse, test};
use catalog::auth::{hash_password, LoginResponse, TokenKeys};
use catalog::db::{encode, DocumentStore, MemoryStore};
use catalog::models::User;
use catalog::services::auth::USER_COLLECTION;
use catalog::AppState;
use serde_json::json;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "adminpassword";
pub const HASH_COST: u32 = 4;

pub fn token_keys() -> TokenKeys {
    TokenKeys::from_secret("integration_test_secret", "demoBackend", 3600)
}

/// Application state over a fresh in-memory store, plus the store itself for seeding.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), token_keys(), HASH_COST);
    (state, store)
}

/// Inserts an administrator directly; registration never grants the flag.
pub async fn seed_admin(store: &MemoryStore) {
    let admin = User {
        id: None,
        email: ADMIN_EMAIL.to_string(),
        password: hash_password(ADMIN_PASSWORD, HASH_COST).expect("hash admin password"),
        full_name: "Admin User".to_string(),
        admin: true,
        created_at: chrono::Utc::now(),
    };
    store
        .insert_one(USER_COLLECTION, encode(&admin).expect("encode admin"))
        .await
        .expect("seed admin");
}

/// Logs in through the API and returns the bearer token.
pub async fn login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<String, String> {
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(&json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Login failed. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let login: LoginResponse = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse login response: {}", e))?;
    Ok(login.token)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
