pub mod auth;
pub mod health;
pub mod products;

use actix_web::web;

/// Prefix of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::index).service(health::health).service(
        web::scope(API_PREFIX)
            .service(
                web::scope("/products")
                    .service(products::get_products)
                    .service(products::create_product)
                    .service(products::get_product)
                    .service(products::replace_product)
                    .service(products::update_product)
                    .service(products::delete_product),
            )
            .service(
                web::scope("/auth")
                    .service(auth::login)
                    .service(auth::register),
            ),
    );
}
