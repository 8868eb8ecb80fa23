use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response};
use crate::{
    auth::AccountContext,
    errors::ServiceError,
    handlers::AppState,
    models::technical_sheet,
    services::technical_sheets::{TechnicalSheetFilter, TechnicalSheetInput},
    ApiResponse, ApiResult,
};

pub async fn list_technical_sheets(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(filter): Query<TechnicalSheetFilter>,
) -> ApiResult<Vec<technical_sheet::Model>> {
    let sheets = state.services.technical_sheets.list(&ctx, filter).await?;
    Ok(Json(ApiResponse::success(sheets)))
}

pub async fn register_technical_sheet(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<TechnicalSheetInput>,
) -> Result<Response, ServiceError> {
    let sheet = state
        .services
        .technical_sheets
        .register(&ctx, payload)
        .await?;
    Ok(created_response(sheet))
}

pub async fn delete_technical_sheet(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.technical_sheets.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub fn technical_sheet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_technical_sheets).post(register_technical_sheet))
        .route("/:id", delete(delete_technical_sheet))
}
