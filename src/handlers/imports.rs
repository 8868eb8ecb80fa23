use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::{
    auth::AccountContext,
    errors::ServiceError,
    handlers::AppState,
    services::bulk_import::{parse_csv, rows_from_json, ImportKind, ImportResult, NumberedRow},
    ApiResponse, ApiResult,
};

#[derive(Debug, Deserialize)]
struct JsonImport {
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

fn is_csv(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("text/csv"))
        .unwrap_or(false)
}

/// Parses the request body into rows: CSV for `text/csv`, `{ "rows": [...] }` otherwise.
fn read_rows(headers: &HeaderMap, body: &str) -> Result<Vec<NumberedRow>, ServiceError> {
    if is_csv(headers) {
        parse_csv(body)
    } else {
        let payload: JsonImport = serde_json::from_str(body)
            .map_err(|e| ServiceError::ValidationError(format!("Invalid import body: {}", e)))?;
        Ok(rows_from_json(payload.rows))
    }
}

pub async fn import_rows(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(kind): Path<String>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<ImportResult> {
    let kind = ImportKind::from_str(&kind)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown import kind: {}", kind)))?;
    let rows = read_rows(&headers, &body)?;
    let result = state.services.imports.import(&ctx, kind, rows).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub fn import_routes() -> Router<AppState> {
    Router::new().route("/:kind", post(import_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn content_type_selects_the_parser() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
        let rows = read_rows(&headers, "name,unit\nCemento,saco\n").unwrap();
        assert_eq!(rows[0].fields.get("unit").map(String::as_str), Some("saco"));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let rows = read_rows(&headers, r#"{"rows":[{"name":"Arena"}]}"#).unwrap();
        assert_eq!(rows[0].fields.get("name").map(String::as_str), Some("Arena"));

        assert!(read_rows(&headers, "name\nArena").is_err());
    }
}
