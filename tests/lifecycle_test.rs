mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{id_of, response_json, TestApp};

async fn quote_request(app: &TestApp, supplier: &Value, company: &Value) -> Value {
    app.expect(
        Method::POST,
        "/api/v1/quote-requests",
        Some(json!({
            "supplier_id": supplier["id"],
            "company_id": company["id"],
            "items": [{ "material_name": "Cabilla 1/2", "quantity": 40.0, "unit": "pieza" }]
        })),
        StatusCode::CREATED,
    )
    .await
}

async fn set_status(app: &TestApp, uri: &str, status: &str) -> axum::response::Response {
    app.request(Method::PUT, uri, Some(json!({ "status": status }))).await
}

#[tokio::test]
async fn quote_request_moves_through_the_transition_table() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-30000001-0", "Ferretería El Tornillo").await;
    let company = app.create_company("J-40000001-0").await;
    let request = quote_request(&app, &supplier, &company).await;
    assert_eq!(request["status"], "Draft");
    let status_uri = format!("/api/v1/quote-requests/{}/status", id_of(&request));

    // Draft cannot jump straight to Approved
    let response = set_status(&app, &status_uri, "Approved").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = set_status(&app, &status_uri, "Sent").await;
    assert_eq!(response.status(), StatusCode::OK);
    let change = response_json(response).await;
    assert_eq!(change["data"]["old_status"], "Draft");
    assert_eq!(change["data"]["new_status"], "Sent");

    // quote requests are never rejected
    let response = set_status(&app, &status_uri, "Rejected").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = set_status(&app, &status_uri, "Approved").await;
    assert_eq!(response.status(), StatusCode::OK);

    // same status is a no-op
    let response = set_status(&app, &status_uri, "Approved").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["changed"], false);

    // approved documents are terminal and read-only
    let response = set_status(&app, &status_uri, "Draft").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/quote-requests/{}", id_of(&request)),
            Some(json!({
                "supplier_id": supplier["id"],
                "company_id": company["id"],
                "items": [{ "material_name": "Cabilla 3/8", "quantity": 10.0 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn documents_are_deleted_only_from_the_archive() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-30000002-0", "Agregados Caroní").await;
    let company = app.create_company("J-40000002-0").await;
    let order = app
        .create_purchase_order(
            &supplier,
            &company,
            json!([{ "material_name": "Arena lavada", "quantity": 6.0, "unit_price": 25.0 }]),
        )
        .await;
    let order_uri = format!("/api/v1/purchase-orders/{}", id_of(&order));

    let response = app.request(Method::DELETE, &order_uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.expect(
        Method::POST,
        &format!("{}/archive", order_uri),
        None,
        StatusCode::OK,
    )
    .await;

    let listed = app
        .expect(Method::GET, "/api/v1/purchase-orders", None, StatusCode::OK)
        .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
    let archived = app
        .expect(
            Method::GET,
            "/api/v1/purchase-orders?filter=archived",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(archived.as_array().map(Vec::len), Some(1));

    let response = app.request(Method::DELETE, &order_uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request(Method::GET, &order_uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivating_a_supplier_archives_its_open_documents() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-30000003-0", "Pinturas Montana").await;
    let company = app.create_company("J-40000003-0").await;

    let request = quote_request(&app, &supplier, &company).await;
    let order = app
        .create_purchase_order(
            &supplier,
            &company,
            json!([{ "material_name": "Pintura caucho", "quantity": 4.0, "unit_price": 18.0 }]),
        )
        .await;

    let outcome = app
        .expect(
            Method::PUT,
            &format!("/api/v1/suppliers/{}/status", id_of(&supplier)),
            Some(json!({ "status": "Inactive" })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(outcome["supplier"]["status"], "Inactive");
    assert_eq!(outcome["archived"]["quote_requests"], 1);
    assert_eq!(outcome["archived"]["purchase_orders"], 1);

    let request = app
        .expect(
            Method::GET,
            &format!("/api/v1/quote-requests/{}", id_of(&request)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(request["status"], "Archived");
    let order = app
        .expect(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", id_of(&order)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(order["status"], "Archived");

    // inactive suppliers take no new documents
    let response = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "supplier_id": supplier["id"],
                "company_id": company["id"],
                "items": [{ "material_name": "Thinner", "quantity": 1.0, "unit_price": 9.0 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn archive_then_unarchive_returns_a_draft() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-30000004-0", "Cerámicas Carabobo").await;
    let company = app.create_company("J-40000004-0").await;
    let request = quote_request(&app, &supplier, &company).await;
    let uri = format!("/api/v1/quote-requests/{}", id_of(&request));

    let change = app
        .expect(Method::POST, &format!("{}/archive", uri), None, StatusCode::OK)
        .await;
    assert_eq!(change["new_status"], "Archived");

    let change = app
        .expect(Method::POST, &format!("{}/unarchive", uri), None, StatusCode::OK)
        .await;
    assert_eq!(change["old_status"], "Archived");
    assert_eq!(change["new_status"], "Draft");

    let request = app.expect(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(request["status"], "Draft");
}

#[tokio::test]
async fn bulk_archive_skips_approved_documents_and_is_idempotent() {
    use procurement_api::{auth::AccountContext, services::lifecycle::LifecycleManager};

    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-30000005-0", "Sanitarios Mérida").await;
    let company = app.create_company("J-40000005-0").await;

    let approved = quote_request(&app, &supplier, &company).await;
    let status_uri = format!("/api/v1/quote-requests/{}/status", id_of(&approved));
    for status in ["Sent", "Approved"] {
        let response = set_status(&app, &status_uri, status).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    quote_request(&app, &supplier, &company).await;
    app.create_purchase_order(
        &supplier,
        &company,
        json!([{ "material_name": "Lavamanos", "quantity": 2.0, "unit_price": 45.0 }]),
    )
    .await;

    let lifecycle = LifecycleManager::new(
        app.state.db.clone(),
        app.state.event_sender.clone(),
        true,
    );
    let ctx = AccountContext::new(app.account_id, "tests@compras");
    let supplier_id = id_of(&supplier).parse().expect("uuid");

    let first = lifecycle
        .bulk_archive_by_supplier(&ctx, supplier_id)
        .await
        .expect("first archive");
    assert_eq!(first.quote_requests, 1);
    assert_eq!(first.purchase_orders, 1);

    let second = lifecycle
        .bulk_archive_by_supplier(&ctx, supplier_id)
        .await
        .expect("second archive");
    assert_eq!(second.quote_requests, 0);
    assert_eq!(second.purchase_orders, 0);

    let approved = app
        .expect(
            Method::GET,
            &format!("/api/v1/quote-requests/{}", id_of(&approved)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(approved["status"], "Approved");
}

#[tokio::test]
async fn stale_status_write_is_a_conflict() {
    use procurement_api::{
        auth::AccountContext,
        errors::ServiceError,
        models::DocumentStatus,
        services::lifecycle::{DocumentKind, LifecycleManager},
    };

    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-30000006-0", "Cerámicas Falcón").await;
    let company = app.create_company("J-40000006-0").await;
    let order = app
        .create_purchase_order(
            &supplier,
            &company,
            json!([{ "material_name": "Porcelanato", "quantity": 30.0, "unit_price": 14.0 }]),
        )
        .await;
    let status_uri = format!("/api/v1/purchase-orders/{}/status", id_of(&order));
    for status in ["Sent", "Approved"] {
        let response = set_status(&app, &status_uri, status).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // A writer that still believes the order is Sent must not overwrite Approved
    let lifecycle = LifecycleManager::new(
        app.state.db.clone(),
        app.state.event_sender.clone(),
        true,
    );
    let ctx = AccountContext::new(app.account_id, "tests@compras");
    let order_id = id_of(&order).parse().expect("uuid");
    let result = lifecycle
        .transition(
            &ctx,
            DocumentKind::PurchaseOrder,
            order_id,
            DocumentStatus::Sent,
            DocumentStatus::Archived,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))), "{:?}", result);

    let order = app
        .expect(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", id_of(&order)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(order["status"], "Approved");
}

#[tokio::test]
async fn documents_cannot_be_moved_onto_an_inactive_supplier() {
    let app = TestApp::new().await;
    let active = app.create_supplier("J-30000007-0", "Aceros Guayana").await;
    let retired = app.create_supplier("J-30000008-0", "Aceros del Centro").await;
    let company = app.create_company("J-40000007-0").await;

    let request = quote_request(&app, &active, &company).await;
    let order = app
        .create_purchase_order(
            &active,
            &company,
            json!([{ "material_name": "Malla truckson", "quantity": 8.0, "unit_price": 21.0 }]),
        )
        .await;

    app.expect(
        Method::PUT,
        &format!("/api/v1/suppliers/{}/status", id_of(&retired)),
        Some(json!({ "status": "Inactive" })),
        StatusCode::OK,
    )
    .await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/quote-requests/{}", id_of(&request)),
            Some(json!({
                "supplier_id": retired["id"],
                "company_id": company["id"],
                "items": [{ "material_name": "Cabilla 1/2", "quantity": 40.0, "unit": "pieza" }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap_or_default().contains("inactive"));

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/purchase-orders/{}", id_of(&order)),
            Some(json!({
                "supplier_id": retired["id"],
                "company_id": company["id"],
                "items": [{ "material_name": "Malla truckson", "quantity": 8.0, "unit_price": 21.0 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let order = app
        .expect(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", id_of(&order)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(order["supplier_id"], active["id"]);
}
