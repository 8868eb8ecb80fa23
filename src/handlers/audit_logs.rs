use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    auth::AccountContext, handlers::AppState, models::audit_log, ApiResponse, ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub table: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Vec<audit_log::Model>> {
    let entries = state
        .services
        .audit_logs
        .list_recent(&ctx, params.table.as_deref(), params.limit)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

pub fn audit_log_routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}
