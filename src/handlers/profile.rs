use axum::{extract::State, routing::get, Json, Router};

use crate::{
    auth::AccountContext, handlers::AppState, models::profile,
    services::profiles::ProfileInput, ApiResponse, ApiResult,
};

pub async fn get_profile(
    State(state): State<AppState>,
    ctx: AccountContext,
) -> ApiResult<profile::Model> {
    Ok(Json(ApiResponse::success(
        state.services.profiles.get(&ctx).await?,
    )))
}

pub async fn update_profile(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<ProfileInput>,
) -> ApiResult<profile::Model> {
    Ok(Json(ApiResponse::success(
        state.services.profiles.upsert(&ctx, payload).await?,
    )))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}
