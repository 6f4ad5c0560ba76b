use crate::{
    auth::{AuthGuard, AuthenticatedUser},
    error::AppError,
    models::{ProductInput, ProductPatch, ProductQuery, ProductResponse},
    services::ProductService,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use bson::oid::ObjectId;
use log::info;
use validator::Validate;

/// Response header carrying the number of products matching the listing's search.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid product id: {}", raw)))
}

fn not_found(id: ObjectId) -> AppError {
    AppError::NotFound(format!("Product {} not found", id.to_hex()))
}

/// Lists products.
///
/// ## Query Parameters:
/// - `search` (optional): full-text terms matched against name and description.
/// - `page` (optional): 1-based page number, defaults to 1.
/// - `limit` (optional): page size, defaults to 10, capped at 20.
///
/// ## Responses:
/// - `200 OK`: JSON array of products, with the total match count in `X-Total-Count`.
/// - `400 Bad Request`: non-numeric `page` or `limit`.
#[get("")]
pub async fn get_products(
    service: web::Data<ProductService>,
    query: web::Query<ProductQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    let search = query.search.as_deref();

    let products = service
        .get_all_products(search, query.page, query.limit)
        .await?;
    let total = service.count_products(search).await?;

    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, total.to_string()))
        .json(body))
}

/// Fetches one product by its 24-character hex identifier.
#[get("/{id}")]
pub async fn get_product(
    service: web::Data<ProductService>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&path)?;
    let product = service.get_one_product(id).await?.ok_or_else(|| not_found(id))?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// Creates a product. Admin only.
///
/// ## Responses:
/// - `201 Created`: the stored product, including its identifier and `createAt`.
/// - `400 Bad Request`: malformed JSON, unknown fields or failed validation.
/// - `401 Unauthorized` / `403 Forbidden`: missing token or non-admin caller.
#[post("", wrap = "AuthGuard::admin()")]
pub async fn create_product(
    service: web::Data<ProductService>,
    body: web::Json<ProductInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let product = service.create_product(body.into_inner()).await?;
    info!("{} created product {:?}", user.0.email, product.name);
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// Replaces every field of a product. Admin only.
#[put("/{id}", wrap = "AuthGuard::admin()")]
pub async fn replace_product(
    service: web::Data<ProductService>,
    path: web::Path<String>,
    body: web::Json<ProductInput>,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&path)?;
    body.validate()?;

    let product = service
        .replace_product(id, body.into_inner())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// Updates the supplied fields of a product. Admin only.
///
/// At least one of `name`, `price`, `description`, `stock` must be present.
#[patch("/{id}", wrap = "AuthGuard::admin()")]
pub async fn update_product(
    service: web::Data<ProductService>,
    path: web::Path<String>,
    body: web::Json<ProductPatch>,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&path)?;
    body.validate()?;

    let product = service
        .update_product(id, body.into_inner())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// Deletes a product. Admin only.
///
/// ## Responses:
/// - `204 No Content`: the product was removed.
/// - `404 Not Found`: nothing matched the identifier.
/// - `500 Internal Server Error`: the delete was not acknowledged.
#[delete("/{id}", wrap = "AuthGuard::admin()")]
pub async fn delete_product(
    service: web::Data<ProductService>,
    path: web::Path<String>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = parse_id(&path)?;
    let outcome = service.delete_product(id).await?;

    if !outcome.acknowledged {
        return Err(AppError::DatabaseError(format!(
            "Delete of product {} was not acknowledged",
            id.to_hex()
        )));
    }
    if outcome.deleted_count == 0 {
        return Err(not_found(id));
    }

    info!("{} deleted product {}", user.0.email, id.to_hex());
    Ok(HttpResponse::NoContent().finish())
}
