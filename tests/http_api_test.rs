mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{id_of, response_json, TestApp, ADMIN_PIN};

#[tokio::test]
async fn health_and_status_need_no_account() {
    let app = TestApp::new().await;

    let response = app.request_as(None, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = response_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");

    let response = app.request_as(None, Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["admin_enabled"], true);
}

#[tokio::test]
async fn account_header_is_required_for_data() {
    let app = TestApp::new().await;

    let response = app
        .request_as(None, Method::GET, "/api/v1/suppliers", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn accounts_never_see_each_other() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-34000001-0", "Ferremax").await;
    let intruder = Uuid::new_v4();

    let response = app
        .request_as(
            Some(intruder),
            Method::GET,
            &format!("/api/v1/suppliers/{}", id_of(&supplier)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request_as(Some(intruder), Method::GET, "/api/v1/suppliers", None)
        .await;
    let listed = response_json(response).await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn request_ids_are_echoed() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "caller-supplied-id")
        .body(axum::body::Body::empty())
        .expect("request");
    let response = tower::ServiceExt::oneshot(procurement_api::app(app.state.clone()), request)
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("caller-supplied-id")
    );
    let body = response_json(response).await;
    assert_eq!(body["meta"]["request_id"], "caller-supplied-id");
}

#[tokio::test]
async fn mutations_are_audited() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-34000002-0", "Auditoría SA").await;
    app.expect(
        Method::DELETE,
        &format!("/api/v1/suppliers/{}", id_of(&supplier)),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;

    let entries = app
        .expect(
            Method::GET,
            "/api/v1/audit-logs?table=suppliers",
            None,
            StatusCode::OK,
        )
        .await;
    let actions: Vec<&str> = entries
        .as_array()
        .expect("entries")
        .iter()
        .filter_map(|e| e["action"].as_str())
        .collect();
    assert!(actions.contains(&"CREATE"));
    assert!(actions.contains(&"DELETE"));
    assert!(entries[0]["actor"] == "tests@compras");
}

#[tokio::test]
async fn admin_purge_needs_the_pin_and_respects_company_references() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-34000003-0", "Purga CA").await;
    let company = app.create_company("J-44000003-0").await;
    app.create_purchase_order(
        &supplier,
        &company,
        json!([{ "material_name": "Clavos", "quantity": 3.0, "unit_price": 2.0 }]),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/delete-all",
            Some(json!({ "pin": "9999", "data_type": "suppliers" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/delete-all",
            Some(json!({ "pin": ADMIN_PIN, "data_type": "companies" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let purged = app
        .expect(
            Method::POST,
            "/api/v1/admin/delete-all",
            Some(json!({ "pin": ADMIN_PIN, "data_type": "suppliers" })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(purged["deleted"], 1);

    let orders = app
        .expect(
            Method::GET,
            "/api/v1/purchase-orders?filter=all",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(orders.as_array().map(Vec::len), Some(0));

    app.expect(
        Method::POST,
        "/api/v1/admin/delete-all",
        Some(json!({ "pin": ADMIN_PIN, "data_type": "companies" })),
        StatusCode::OK,
    )
    .await;
}
