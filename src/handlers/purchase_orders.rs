use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use super::{
    common::{created_response, no_content_response},
    quote_requests::{DocumentListParams, DocumentStatusRequest},
};
use crate::{
    auth::AccountContext,
    commands::purchaseorders::{PurchaseOrderDetails, PurchaseOrderInput},
    errors::ServiceError,
    handlers::AppState,
    models::purchase_order,
    services::lifecycle::StatusChange,
    ApiResponse, ApiResult,
};

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<DocumentListParams>,
) -> ApiResult<Vec<purchase_order::Model>> {
    let orders = state
        .services
        .purchase_orders
        .list(&ctx, params.filter, params.supplier_id)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<PurchaseOrderDetails> {
    let details = state.services.purchase_orders.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<PurchaseOrderInput>,
) -> Result<Response, ServiceError> {
    let details = state.services.purchase_orders.create(&ctx, payload).await?;
    info!(order_number = %details.order_number, "Purchase order created");
    Ok(created_response(details))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchaseOrderInput>,
) -> ApiResult<PurchaseOrderDetails> {
    let details = state
        .services
        .purchase_orders
        .update(&ctx, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn set_purchase_order_status(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentStatusRequest>,
) -> ApiResult<StatusChange> {
    let change = state
        .services
        .purchase_orders
        .set_status(&ctx, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(change)))
}

pub async fn archive_purchase_order(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusChange> {
    let change = state.services.purchase_orders.archive(&ctx, id).await?;
    Ok(Json(ApiResponse::success(change)))
}

pub async fn unarchive_purchase_order(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusChange> {
    let change = state.services.purchase_orders.unarchive(&ctx, id).await?;
    Ok(Json(ApiResponse::success(change)))
}

pub async fn delete_purchase_order(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.purchase_orders.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchase_orders).post(create_purchase_order))
        .route(
            "/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route("/:id/status", put(set_purchase_order_status))
        .route("/:id/archive", post(archive_purchase_order))
        .route("/:id/unarchive", post(unarchive_purchase_order))
}
