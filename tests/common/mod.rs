#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use procurement_api::{
    auth::{ACCOUNT_ID_HEADER, ACTOR_HEADER},
    config::AppConfig,
    db,
    events::{self, EventSender},
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_PIN: &str = "2468";

/// Application backed by a throwaway SQLite file, addressed as one account.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub account_id: Uuid,
    _dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("procurement_test.sqlite").display()
        );

        let mut cfg = AppConfig::new(url, "127.0.0.1".into(), 18_080, "test".into());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.admin_pin = Some(ADMIN_PIN.into());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let state = AppState::new(Arc::new(pool), cfg, Arc::new(EventSender::new(event_tx)));

        Self {
            router: procurement_api::app(state.clone()),
            state,
            account_id: Uuid::new_v4(),
            _dir: dir,
            _event_task: event_task,
        }
    }

    /// Sends a request as `account`; `None` leaves the account header off.
    pub async fn request_as(
        &self,
        account: Option<Uuid>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(account) = account {
            builder = builder
                .header(ACCOUNT_ID_HEADER, account.to_string())
                .header(ACTOR_HEADER, "tests@compras");
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request")
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_as(Some(self.account_id), method, uri, body).await
    }

    pub async fn post_csv(&self, uri: &str, csv: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(ACCOUNT_ID_HEADER, self.account_id.to_string())
            .header("content-type", "text/csv")
            .body(Body::from(csv.to_string()))
            .expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends the request, asserts the status and returns the `data` member.
    pub async fn expect(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        status: StatusCode,
    ) -> Value {
        let response = self.request(method, uri, body).await;
        let actual = response.status();
        let json = response_json(response).await;
        assert_eq!(actual, status, "unexpected status for {}: {}", uri, json);
        json.get("data").cloned().unwrap_or(json)
    }

    pub async fn create_supplier(&self, rif: &str, name: &str) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({ "rif": rif, "name": name, "payment_terms": "Contado" })),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_material(&self, name: &str) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/materials",
            Some(json!({ "name": name, "unit": "saco" })),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_company(&self, rif: &str) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "rif": rif, "name": "Constructora Andina" })),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_purchase_order(&self, supplier: &Value, company: &Value, items: Value) -> Value {
        self.expect(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "supplier_id": supplier["id"],
                "company_id": company["id"],
                "items": items,
            })),
            StatusCode::CREATED,
        )
        .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}
