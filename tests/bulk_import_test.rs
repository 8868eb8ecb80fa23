mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{response_json, TestApp};

fn supplier_by_rif<'a>(suppliers: &'a Value, rif: &str) -> Option<&'a Value> {
    suppliers
        .as_array()
        .and_then(|list| list.iter().find(|s| s["rif"] == rif))
}

#[tokio::test]
async fn csv_rows_create_update_and_report_failures() {
    let app = TestApp::new().await;
    let existing = app.create_supplier("J-33000001-0", "Nombre Viejo").await;
    let code = existing["code"].as_str().expect("code").to_string();

    // the second data row carries an existing code and updates in place
    let csv = format!(
        "Code,RIF,Name,Payment_Terms,Credit_Days,Status\n\
         ,J-33000002-0,Plomería Express,credito,30,Activo\n\
         {code},J-33000001-0,Nombre Nuevo,contado,,\n\
         ,J-33000003-0,,contado,,\n"
    );

    let response = app.post_csv("/api/v1/imports/suppliers", &csv).await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = response_json(response).await["data"].clone();

    assert_eq!(result["success_count"], 2);
    assert_eq!(result["failure_count"], 1);
    let errors = result["errors"].as_array().expect("errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["row"], 4);
    assert_eq!(errors[0]["reason"], "Missing required field: name");

    let suppliers = app
        .expect(Method::GET, "/api/v1/suppliers", None, StatusCode::OK)
        .await;
    assert_eq!(suppliers.as_array().map(Vec::len), Some(2));

    let updated = supplier_by_rif(&suppliers, "J-33000001-0").expect("updated supplier");
    assert_eq!(updated["name"], "Nombre Nuevo");
    assert_eq!(updated["code"], code.as_str());

    let created = supplier_by_rif(&suppliers, "J-33000002-0").expect("created supplier");
    assert_eq!(created["payment_terms"], "Crédito");
    assert_eq!(created["credit_days"], 30);
}

#[tokio::test]
async fn failures_name_the_file_line_past_blank_lines() {
    let app = TestApp::new().await;

    let response = app
        .post_csv(
            "/api/v1/imports/suppliers",
            "rif,name\nJ-33000010-0,Acme\n\nJ-33000011-0,\n",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = response_json(response).await["data"].clone();

    assert_eq!(result["success_count"], 1);
    assert_eq!(result["errors"][0]["row"], 4);
    assert_eq!(result["errors"][0]["reason"], "Missing required field: name");
}

#[tokio::test]
async fn json_rows_link_suppliers_and_materials() {
    let app = TestApp::new().await;
    let supplier = app.create_supplier("J-33000004-0", "Herrajes Zulia").await;
    let material = app.create_material("Bisagra 3\"").await;

    let result = app
        .expect(
            Method::POST,
            "/api/v1/imports/supplier-materials",
            Some(json!({
                "rows": [
                    {
                        "supplier_code": supplier["code"],
                        "material_code": material["code"],
                        "specification": "Acero inoxidable"
                    },
                    { "supplier_code": supplier["code"], "material_code": "MAT-9999" }
                ]
            })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(result["success_count"], 1);
    assert_eq!(result["failure_count"], 1);
    assert_eq!(result["errors"][0]["row"], 3);

    let linked = app
        .expect(
            Method::GET,
            &format!("/api/v1/suppliers/{}/materials", supplier["id"].as_str().unwrap_or_default()),
            None,
            StatusCode::OK,
        )
        .await;
    let linked = linked.as_array().expect("materials");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["specification"], "Acero inoxidable");
}

#[tokio::test]
async fn empty_imports_and_unknown_kinds_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/v1/imports/materials", Some(json!({ "rows": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::POST, "/api/v1/imports/invoices", Some(json!({ "rows": [{}] })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exported_materials_import_back_as_updates() {
    let app = TestApp::new().await;
    app.create_material("Yeso").await;
    app.create_material("Pego cerámico").await;

    let response = app.request(Method::GET, "/api/v1/exports/materials", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let csv = match response_json(response).await {
        Value::String(text) => text,
        other => panic!("expected csv text, got {}", other),
    };
    assert!(csv.starts_with("code,name,unit,category,description"));

    let result = app
        .post_csv("/api/v1/imports/materials", &csv)
        .await;
    let result = response_json(result).await["data"].clone();
    assert_eq!(result["success_count"], 2);

    let materials = app
        .expect(Method::GET, "/api/v1/materials", None, StatusCode::OK)
        .await;
    assert_eq!(materials.as_array().map(Vec::len), Some(2));
}
