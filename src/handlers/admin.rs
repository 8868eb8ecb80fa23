use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::AccountContext,
    handlers::AppState,
    services::admin::{DataType, PurgeResult},
    ApiResponse, ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct DeleteAllRequest {
    pub pin: String,
    pub data_type: DataType,
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

pub async fn delete_all(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<DeleteAllRequest>,
) -> ApiResult<PurgeResult> {
    let result = state
        .services
        .admin
        .delete_all(&ctx, &payload.pin, payload.data_type)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn reset_sequence(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<PinRequest>,
) -> ApiResult<Value> {
    state.services.admin.reset_sequence(&ctx, &payload.pin).await?;
    Ok(Json(ApiResponse::success(json!({ "next_sequence_number": 1 }))))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/delete-all", post(delete_all))
        .route("/reset-sequence", post(reset_sequence))
}
