//! Registration and login.

use std::sync::Arc;

use bson::doc;
use log::info;

use crate::auth::{hash_password, verify_password, RegisterRequest, TokenKeys};
use crate::db::{decode, encode, DocumentStore, StoreError};
use crate::error::AppError;
use crate::models::User;

pub const USER_COLLECTION: &str = "users";

pub const DUPLICATE_EMAIL: &str = "Email already exists";

pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    tokens: Arc<TokenKeys>,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: Arc<TokenKeys>, hash_cost: u32) -> Self {
        Self {
            store,
            tokens,
            hash_cost,
        }
    }

    /// Registers a non-admin account.
    ///
    /// Uniqueness of the email is checked before the insert; a unique index,
    /// where the store has one, turns a concurrent duplicate into the same error.
    pub async fn create_user(&self, input: RegisterRequest) -> Result<User, AppError> {
        let existing = self
            .store
            .find_one(USER_COLLECTION, doc! { "email": &input.email })
            .await?;
        if existing.is_some() {
            return Err(AppError::BadRequest(DUPLICATE_EMAIL.into()));
        }

        let mut user = User {
            id: None,
            email: input.email,
            password: hash_password(&input.password, self.hash_cost)?,
            full_name: input.full_name,
            admin: false,
            created_at: bson::DateTime::now().to_chrono(),
        };

        let id = match self.store.insert_one(USER_COLLECTION, encode(&user)?).await {
            Ok(id) => id,
            Err(StoreError::DuplicateKey(_)) => {
                return Err(AppError::BadRequest(DUPLICATE_EMAIL.into()))
            }
            Err(err) => return Err(err.into()),
        };
        user.id = Some(id);

        info!("User {} registered", id);
        Ok(user)
    }

    /// Returns a signed token, or `None` when the email is unknown or the
    /// password does not match.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<Option<String>, AppError> {
        let Some(doc) = self
            .store
            .find_one(USER_COLLECTION, doc! { "email": email })
            .await?
        else {
            return Ok(None);
        };

        let user: User = decode(doc)?;
        if !verify_password(password, &user.password)? {
            return Ok(None);
        }

        Ok(Some(self.tokens.issue(&user)?))
    }
}
