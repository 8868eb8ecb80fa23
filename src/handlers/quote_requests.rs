use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, no_content_response};
use crate::{
    auth::AccountContext,
    commands::quoterequests::{QuoteRequestDetails, QuoteRequestInput},
    errors::ServiceError,
    handlers::AppState,
    models::{quote_request, DocumentStatus, StatusFilter},
    services::lifecycle::StatusChange,
    ApiResponse, ApiResult,
};

/// `?filter=active|approved|rejected|archived|all&supplier_id=`
#[derive(Debug, Default, Deserialize)]
pub struct DocumentListParams {
    #[serde(default)]
    pub filter: StatusFilter,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentStatusRequest {
    pub status: DocumentStatus,
}

pub async fn list_quote_requests(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<DocumentListParams>,
) -> ApiResult<Vec<quote_request::Model>> {
    let requests = state
        .services
        .quote_requests
        .list(&ctx, params.filter, params.supplier_id)
        .await?;
    Ok(Json(ApiResponse::success(requests)))
}

pub async fn get_quote_request(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<QuoteRequestDetails> {
    let details = state.services.quote_requests.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn create_quote_request(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<QuoteRequestInput>,
) -> Result<Response, ServiceError> {
    let details = state.services.quote_requests.create(&ctx, payload).await?;
    Ok(created_response(details))
}

pub async fn update_quote_request(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuoteRequestInput>,
) -> ApiResult<QuoteRequestDetails> {
    let details = state
        .services
        .quote_requests
        .update(&ctx, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn set_quote_request_status(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentStatusRequest>,
) -> ApiResult<StatusChange> {
    let change = state
        .services
        .quote_requests
        .set_status(&ctx, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(change)))
}

pub async fn archive_quote_request(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusChange> {
    let change = state.services.quote_requests.archive(&ctx, id).await?;
    Ok(Json(ApiResponse::success(change)))
}

pub async fn unarchive_quote_request(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusChange> {
    let change = state.services.quote_requests.unarchive(&ctx, id).await?;
    Ok(Json(ApiResponse::success(change)))
}

pub async fn delete_quote_request(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.quote_requests.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub fn quote_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quote_requests).post(create_quote_request))
        .route(
            "/:id",
            get(get_quote_request)
                .put(update_quote_request)
                .delete(delete_quote_request),
        )
        .route("/:id/status", put(set_quote_request_status))
        .route("/:id/archive", post(archive_quote_request))
        .route("/:id/unarchive", post(unarchive_quote_request))
}
