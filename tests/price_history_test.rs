mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{id_of, TestApp};

#[tokio::test]
async fn order_lines_with_materials_feed_the_price_history() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-32000001-0", "Cementos Catatumbo").await;
    let company = app.create_company("J-42000001-0").await;
    let cement = app.create_material("Cemento gris").await;
    let lime = app.create_material("Cal hidratada").await;

    let order = app
        .create_purchase_order(
            &supplier,
            &company,
            json!([
                { "material_id": cement["id"], "material_name": "Cemento gris", "quantity": 20.0, "unit_price": 9.5 },
                { "material_id": lime["id"], "material_name": "Cal hidratada", "quantity": 5.0, "unit_price": 4.0 },
                { "material_name": "Flete", "quantity": 1.0, "unit_price": 40.0 }
            ]),
        )
        .await;

    let cement_history_uri = format!("/api/v1/materials/{}/price-history", id_of(&cement));
    let history = app
        .expect(Method::GET, &cement_history_uri, None, StatusCode::OK)
        .await;
    let entries = history.as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["unit_price"], 9.5);
    assert_eq!(entries[0]["supplier_id"], supplier["id"]);
    assert_eq!(entries[0]["purchase_order_id"], order["id"]);

    // editing the order replaces its entries: lime drops out, cement changes price
    app.expect(
        Method::PUT,
        &format!("/api/v1/purchase-orders/{}", id_of(&order)),
        Some(json!({
            "supplier_id": supplier["id"],
            "company_id": company["id"],
            "items": [
                { "material_id": cement["id"], "material_name": "Cemento gris", "quantity": 20.0, "unit_price": 10.0 }
            ]
        })),
        StatusCode::OK,
    )
    .await;

    let history = app
        .expect(Method::GET, &cement_history_uri, None, StatusCode::OK)
        .await;
    let entries = history.as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["unit_price"], 10.0);

    let lime_history = app
        .expect(
            Method::GET,
            &format!("/api/v1/materials/{}/price-history", id_of(&lime)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(lime_history.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn price_summary_compares_suppliers_in_one_currency() {
    let app = TestApp::new().await;
    let cheap = app.create_supplier("J-32000002-0", "Acero Barato").await;
    let pricey = app.create_supplier("J-32000003-0", "Acero Caro").await;
    let company = app.create_company("J-42000002-0").await;
    let rebar = app.create_material("Cabilla 1/2").await;

    for (supplier, price) in [(&cheap, 7.0), (&cheap, 9.0), (&pricey, 12.0)] {
        app.create_purchase_order(
            supplier,
            &company,
            json!([{ "material_id": rebar["id"], "material_name": "Cabilla 1/2", "quantity": 10.0, "unit_price": price }]),
        )
        .await;
    }

    let summary = app
        .expect(
            Method::GET,
            &format!("/api/v1/materials/{}/price-summary?currency=USD", id_of(&rebar)),
            None,
            StatusCode::OK,
        )
        .await;
    let rows = summary.as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["supplier_name"], "Acero Barato");
    assert_eq!(rows[0]["count"], 2);
    assert_eq!(rows[0]["average_price"], 8.0);
    assert_eq!(rows[0]["min_price"], 7.0);
    assert_eq!(rows[0]["max_price"], 9.0);
    assert_eq!(rows[1]["average_price"], 12.0);
}

#[tokio::test]
async fn deleting_an_archived_order_removes_its_entries() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-32000004-0", "Maderas Apure").await;
    let company = app.create_company("J-42000003-0").await;
    let plank = app.create_material("Tabla pino").await;

    let order = app
        .create_purchase_order(
            &supplier,
            &company,
            json!([{ "material_id": plank["id"], "material_name": "Tabla pino", "quantity": 12.0, "unit_price": 3.25 }]),
        )
        .await;
    let order_uri = format!("/api/v1/purchase-orders/{}", id_of(&order));
    app.expect(Method::POST, &format!("{}/archive", order_uri), None, StatusCode::OK)
        .await;
    app.expect(Method::DELETE, &order_uri, None, StatusCode::NO_CONTENT)
        .await;

    let history = app
        .expect(
            Method::GET,
            &format!("/api/v1/materials/{}/price-history", id_of(&plank)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(history.as_array().map(Vec::len), Some(0));
}
