mod common;

use std::net::TcpListener;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use catalog::routes;
use serde_json::json;

use common::test_state;

#[actix_rt::test]
async fn test_real_server_round_trip() {
    let (state, _store) = test_state();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header().max_age(3600))
            .wrap(Logger::default())
            .configure(|cfg| state.register(cfg))
            .configure(routes::config)
    })
    .listen(listener)
    .expect("Failed to listen on test port")
    .workers(1)
    .run();
    let handle = server.handle();
    let server_task = actix_rt::spawn(server);

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let resp = client.get(format!("{}/", base)).send().await.expect("root request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Server working!");

    let resp = client
        .post(format!("{}/api/v1/products", base))
        .json(&json!({
            "name": "Unauthorized Product",
            "price": 1999,
            "description": "Should never be stored",
            "stock": 1
        }))
        .send()
        .await
        .expect("create request");
    assert_eq!(
        resp.status(),
        reqwest::StatusCode::UNAUTHORIZED,
        "Expected 401 Unauthorized, got {}. Body: {:?}",
        resp.status(),
        resp.text().await.unwrap_or_else(|_| "<failed to read body>".to_string())
    );

    let resp = client
        .get(format!("{}/api/v1/products", base))
        .send()
        .await
        .expect("list request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-total-count").and_then(|v| v.to_str().ok()),
        Some("0")
    );
    let products: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert!(products.is_empty());

    handle.stop(true).await;
    let _ = server_task.await;
}
