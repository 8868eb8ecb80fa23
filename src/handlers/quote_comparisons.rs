use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response};
use crate::{
    auth::AccountContext,
    errors::ServiceError,
    handlers::AppState,
    models::quote_comparison,
    services::quote_comparisons::{BestOffer, QuoteComparisonDetails, QuoteComparisonInput},
    ApiResponse, ApiResult,
};

pub async fn list_quote_comparisons(
    State(state): State<AppState>,
    ctx: AccountContext,
) -> ApiResult<Vec<quote_comparison::Model>> {
    let comparisons = state.services.quote_comparisons.list(&ctx).await?;
    Ok(Json(ApiResponse::success(comparisons)))
}

pub async fn get_quote_comparison(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<QuoteComparisonDetails> {
    let details = state.services.quote_comparisons.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn create_quote_comparison(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<QuoteComparisonInput>,
) -> Result<Response, ServiceError> {
    let details = state
        .services
        .quote_comparisons
        .create(&ctx, payload)
        .await?;
    Ok(created_response(details))
}

pub async fn delete_quote_comparison(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.quote_comparisons.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub async fn best_offers(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<BestOffer>> {
    let offers = state.services.quote_comparisons.best_offers(&ctx, id).await?;
    Ok(Json(ApiResponse::success(offers)))
}

pub fn quote_comparison_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quote_comparisons).post(create_quote_comparison))
        .route(
            "/:id",
            get(get_quote_comparison).delete(delete_quote_comparison),
        )
        .route("/:id/best-offers", get(best_offers))
}
