use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, SearchParams};
use crate::{
    auth::AccountContext,
    errors::ServiceError,
    handlers::AppState,
    models::company,
    services::companies::CompanyInput,
    ApiResponse, ApiResult,
};

pub async fn list_companies(
    State(state): State<AppState>,
    ctx: AccountContext,
) -> ApiResult<Vec<company::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.companies.list(&ctx).await?,
    )))
}

pub async fn search_companies(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<company::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.companies.search(&ctx, &params.q).await?,
    )))
}

pub async fn get_company(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<company::Model> {
    Ok(Json(ApiResponse::success(
        state.services.companies.get(&ctx, id).await?,
    )))
}

pub async fn create_company(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<CompanyInput>,
) -> Result<Response, ServiceError> {
    let company = state.services.companies.create(&ctx, payload).await?;
    Ok(created_response(company))
}

pub async fn update_company(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompanyInput>,
) -> ApiResult<company::Model> {
    Ok(Json(ApiResponse::success(
        state.services.companies.update(&ctx, id, payload).await?,
    )))
}

pub async fn delete_company(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.companies.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/search", get(search_companies))
        .route(
            "/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
}
