use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::str::FromStr;

use crate::{
    auth::AccountContext, errors::ServiceError, handlers::AppState,
    services::exports::ExportKind,
};

/// Spreadsheet-compatible CSV download
pub async fn export_csv(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(kind): Path<String>,
) -> Result<Response, ServiceError> {
    let kind = ExportKind::from_str(&kind)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown export kind: {}", kind)))?;
    let csv = state.services.exports.export(&ctx, kind).await?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", kind),
            ),
        ],
        csv,
    )
        .into_response())
}

pub fn export_routes() -> Router<AppState> {
    Router::new().route("/:kind", get(export_csv))
}
