use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use retail_api::{app, AppState};
use retail_core::CooldownRepository;
use retail_store::app_config::OrdersConfig;
use retail_store::{InMemoryStore, Repositories};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let state = AppState::new(Repositories::in_memory(store.clone()), &OrdersConfig::default());
    (app(state), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_product(app: &Router, name: &str, price: f64, quantity: i32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/product",
        Some(json!({ "name": name, "price": price, "quantity": quantity })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/customer",
        Some(json!({ "name": name, "email": email, "phone": "555-0100" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], email);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_order_flow_and_cooldown() {
    let (app, _) = test_app();
    let lamp = create_product(&app, "Desk Lamp", 10.0, 5).await;
    let shade = create_product(&app, "Lamp Shade", 4.5, 10).await;
    let jane = register(&app, "Jane Doe", "jane@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/order",
        Some(json!({ "customer_id": jane, "product_id": lamp, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_amount"], 20.0);
    assert_eq!(body["customer_name"], "Jane Doe");
    assert_eq!(body["product_name"], "Desk Lamp");

    let (_, product) = send(&app, "GET", &format!("/api/v1/product/{}", lamp), None).await;
    assert_eq!(product["quantity"], 3);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/order",
        Some(json!({ "customer_id": jane, "product_id": shade, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let seconds = body["cooldown_remaining_seconds"].as_i64().unwrap();
    assert!(seconds > 290 && seconds <= 300);
    assert!(body["cooldown_remaining_minutes"].as_f64().unwrap() > 4.8);

    let (status, body) = send(&app, "GET", &format!("/api/v1/customer/{}/cooldown", jane), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_order"], false);

    let (status, body) = send(&app, "GET", &format!("/api/v1/orders/customer/{}", jane), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, txns) = send(&app, "GET", &format!("/api/v1/transactions?customer_id={}", jane), None).await;
    let txns = txns.as_array().unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0]["type"], "order");
    assert_eq!(txns[0]["product_name"], "Desk Lamp");
}

#[tokio::test]
async fn test_order_rejections() {
    let (app, store) = test_app();
    let bulb = create_product(&app, "Bulb", 1.25, 3).await;
    let jane = register(&app, "Jane Doe", "jane@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/order",
        Some(json!({ "customer_id": jane, "product_id": bulb, "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["available_quantity"], 3);
    assert_eq!(body["requested_quantity"], 4);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/order",
        Some(json!({ "customer_id": "CUST00000", "product_id": bulb, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("CUST00000"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/order",
        Some(json!({ "customer_id": jane, "product_id": "PROD00000", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/v1/order", Some(json!({ "customer_id": jane }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/v1/orders/customer/CUST00000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Backdated cooldown no longer blocks.
    store
        .upsert_cooldown(&jane, Utc::now() - Duration::minutes(10))
        .await
        .unwrap();
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/order",
        Some(json!({ "customer_id": jane, "product_id": bulb, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_catalog_and_customer_endpoints() {
    let (app, _) = test_app();
    let lamp = create_product(&app, "Desk Lamp", 24.5, 10).await;
    create_product(&app, "Bulb", 1.5, 2).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/product",
        Some(json!({ "name": "Broken", "price": -1.0, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/product/{}", lamp),
        Some(json!({ "price": 19.99 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 19.99);
    assert_eq!(body["quantity"], 10);

    let (status, _) = send(&app, "GET", "/api/v1/product/PROD00000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, found) = send(&app, "GET", "/api/v1/products/search?name=lamp", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (_, low) = send(&app, "GET", "/api/v1/products/low-stock", None).await;
    assert_eq!(low.as_array().unwrap().len(), 1);

    let (_, page) = send(&app, "GET", "/api/v1/products?limit=1&offset=0", None).await;
    assert_eq!(page.as_array().unwrap().len(), 1);

    register(&app, "Jane Doe", "jane@example.com").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/customer",
        Some(json!({ "name": "Janet", "email": "jane@example.com", "phone": "555-0101" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, found) = send(&app, "GET", "/api/v1/customers/search?name=jane", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reporting_endpoints() {
    let (app, _) = test_app();
    let lamp = create_product(&app, "Desk Lamp", 10.0, 5).await;
    let jane = register(&app, "Jane Doe", "jane@example.com").await;
    let john = register(&app, "John Roe", "john@example.com").await;

    for customer in [&jane, &john] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/order",
            Some(json!({ "customer_id": customer, "product_id": lamp, "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, stats) = send(&app, "GET", "/api/v1/transactions/stats?period=today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["order_count"], 2);
    assert_eq!(stats["total_revenue"], 40.0);
    assert_eq!(stats["unique_customers"], 2);
    assert_eq!(stats["top_selling_products"][0]["product_name"], "Desk Lamp");

    let (status, _) = send(&app, "GET", "/api/v1/transactions/stats?period=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = send(&app, "GET", "/api/v1/transactions/stats/comprehensive", None).await;
    assert_eq!(all["all_time"]["order_count"], 2);
    assert_eq!(all["this_month"]["total_quantity_sold"], 4);

    let (status, summary) = send(
        &app,
        "GET",
        &format!("/api/v1/transactions/customer/{}/summary", jane),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_transactions"], 1);
    assert_eq!(summary["total_spent"], 20.0);
    assert_eq!(summary["customer_email"], "jane@example.com");

    let (_, today) = send(&app, "GET", "/api/v1/orders/today", None).await;
    assert_eq!(today.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_query_strings_get_json_errors() {
    let (app, _) = test_app();

    for uri in [
        "/api/v1/transactions?start_date=2024-13-01&end_date=2024-12-31",
        "/api/v1/products?limit=abc",
        "/api/v1/orders?offset=-x",
        "/api/v1/products/low-stock?threshold=many",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{} returned {}", uri, body);
    }
}
