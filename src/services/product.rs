//! Product catalog operations on top of the persistence gateway.

use std::sync::Arc;

use bson::{doc, oid::ObjectId, Document};
use log::info;

use crate::db::{by_id, decode, encode, DeleteOutcome, DocumentStore, Page};
use crate::error::AppError;
use crate::models::{Product, ProductInput, ProductPatch};

pub const PRODUCT_COLLECTION: &str = "products";

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 20;

/// Turns 1-based `page` / `limit` query values into a store window.
///
/// `page` below 1 becomes 1; `limit` is clamped to `1..=MAX_PAGE_SIZE` and
/// defaults to `DEFAULT_PAGE_SIZE`. The skip never exceeds `i64::MAX`, the
/// largest value the database accepts.
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> Page {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    Page {
        skip: ((page - 1) as u64)
            .saturating_mul(limit as u64)
            .min(i64::MAX as u64),
        limit,
    }
}

fn search_filter(search: Option<&str>) -> Document {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(terms) => doc! { "$text": { "$search": terms } },
        None => doc! {},
    }
}

fn decode_product(doc: Document) -> Result<Product, AppError> {
    Ok(decode(doc)?)
}

pub struct ProductService {
    store: Arc<dyn DocumentStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists products, optionally full-text filtered, one page at a time.
    pub async fn get_all_products(
        &self,
        search: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, AppError> {
        self.store
            .find(
                PRODUCT_COLLECTION,
                search_filter(search),
                Some(page_window(page, limit)),
            )
            .await?
            .into_iter()
            .map(decode_product)
            .collect()
    }

    /// Number of products matching `search`, ignoring pagination.
    pub async fn count_products(&self, search: Option<&str>) -> Result<u64, AppError> {
        Ok(self
            .store
            .count_documents(PRODUCT_COLLECTION, search_filter(search))
            .await?)
    }

    pub async fn get_one_product(&self, id: ObjectId) -> Result<Option<Product>, AppError> {
        self.store
            .find_one(PRODUCT_COLLECTION, by_id(id))
            .await?
            .map(decode_product)
            .transpose()
    }

    /// Stamps the creation time, stores the product and returns it with its identifier.
    pub async fn create_product(&self, input: ProductInput) -> Result<Product, AppError> {
        let mut product = Product::new(input);
        let id = self
            .store
            .insert_one(PRODUCT_COLLECTION, encode(&product)?)
            .await?;
        product.id = Some(id);

        info!("Product {} created", id);
        Ok(product)
    }

    /// Replaces every data field, including a fresh creation timestamp.
    pub async fn replace_product(
        &self,
        id: ObjectId,
        input: ProductInput,
    ) -> Result<Option<Product>, AppError> {
        let replacement = encode(&Product::new(input))?;
        self.store
            .find_one_and_replace(PRODUCT_COLLECTION, by_id(id), replacement)
            .await?
            .map(decode_product)
            .transpose()
    }

    /// Writes only the fields present in `patch`.
    pub async fn update_product(
        &self,
        id: ObjectId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, AppError> {
        let fields = encode(&patch)?;
        self.store
            .find_one_and_update(PRODUCT_COLLECTION, by_id(id), fields)
            .await?
            .map(decode_product)
            .transpose()
    }

    pub async fn delete_product(&self, id: ObjectId) -> Result<DeleteOutcome, AppError> {
        let outcome = self
            .store
            .delete_one(PRODUCT_COLLECTION, by_id(id))
            .await?;
        if outcome.deleted_count > 0 {
            info!("Product {} deleted", id);
        }
        Ok(outcome)
    }
}
