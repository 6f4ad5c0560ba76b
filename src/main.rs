use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use log::{info, warn};

use catalog::auth::TokenKeys;
use catalog::config::{Config, CorsConfig, CorsOrigins};
use catalog::db::MongoStore;
use catalog::{routes, AppState};

fn cors(config: &CorsConfig) -> Cors {
    let cors = match &config.origins {
        CorsOrigins::Any => Cors::default().allow_any_origin(),
        CorsOrigins::List(origins) => origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin)),
    };
    cors.allow_any_method()
        .allow_any_header()
        .expose_headers([routes::products::TOTAL_COUNT_HEADER])
        .max_age(config.max_age)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let store = Arc::new(MongoStore::new(&config.mongo_uri, &config.database_name));
    if let Err(e) = store.ensure_indexes().await {
        warn!("Could not create indexes, continuing without them: {}", e);
    }

    let state = AppState::new(store, TokenKeys::new(&config.jwt), config.bcrypt_cost);
    let cors_config = config.cors.clone();

    info!("Starting catalog server at {}", config.server_url());
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(cors(&cors_config))
            .wrap(Logger::default())
            .configure(|cfg| state.register(cfg))
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
