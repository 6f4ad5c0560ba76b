use bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A catalog product as stored in the `products` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Database-assigned identifier; absent until the product is inserted.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    /// Price in minor currency units (cents).
    pub price: i64,
    #[serde(default)]
    pub description: String,
    pub stock: i64,
    #[serde(rename = "createAt", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Builds an unsaved product from validated input, stamped with the current time.
    ///
    /// The timestamp is truncated to the millisecond precision the database keeps,
    /// so the returned value matches what a later read yields.
    pub fn new(input: ProductInput) -> Self {
        Self {
            id: None,
            name: input.name,
            price: input.price,
            description: input.description,
            stock: input.stock,
            created_at: bson::DateTime::now().to_chrono(),
        }
    }
}

/// Body of create and full-replace requests.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(range(min = 100, message = "price must be at least 100"))]
    pub price: i64,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: i64,
}

/// Body of partial-update requests. Only supplied fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_patch_not_empty"))]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 100, message = "price must be at least 100"))]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.stock.is_none()
    }
}

fn validate_patch_not_empty(patch: &ProductPatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        let mut error = ValidationError::new("empty_patch");
        error.message = Some("at least one field must be supplied".into());
        return Err(error);
    }
    Ok(())
}

/// Query string of the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// JSON shape of a product in API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub stock: i64,
    #[serde(rename = "createAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: product.name,
            price: product.price,
            description: product.description,
            stock: product.stock,
            created_at: product.created_at,
        }
    }
}
