use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, no_content_response, SearchParams};
use crate::{
    auth::AccountContext,
    errors::ServiceError,
    handlers::AppState,
    models::{material, price_history, Currency},
    services::{
        materials::{MaterialInput, MaterialOffer},
        price_history::SupplierPriceSummary,
    },
    ApiResponse, ApiResult,
};

#[derive(Debug, Default, Deserialize)]
pub struct PriceHistoryParams {
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PriceSummaryParams {
    #[serde(default = "usd")]
    pub currency: Currency,
    /// VES per USD for entries stored without a rate
    pub exchange_rate: Option<f64>,
}

fn usd() -> Currency {
    Currency::Usd
}

pub async fn list_materials(
    State(state): State<AppState>,
    ctx: AccountContext,
) -> ApiResult<Vec<material::Model>> {
    let materials = state.services.materials.list(&ctx).await?;
    Ok(Json(ApiResponse::success(materials)))
}

pub async fn search_materials(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<material::Model>> {
    let materials = state.services.materials.search(&ctx, &params.q).await?;
    Ok(Json(ApiResponse::success(materials)))
}

pub async fn get_material(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<material::Model> {
    let material = state.services.materials.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(material)))
}

pub async fn create_material(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<MaterialInput>,
) -> Result<Response, ServiceError> {
    let material = state.services.materials.create(&ctx, payload).await?;
    Ok(created_response(material))
}

pub async fn update_material(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaterialInput>,
) -> ApiResult<material::Model> {
    let material = state.services.materials.update(&ctx, id, payload).await?;
    Ok(Json(ApiResponse::success(material)))
}

pub async fn delete_material(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.materials.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub async fn material_suppliers(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<MaterialOffer>> {
    let offers = state.services.materials.suppliers_for(&ctx, id).await?;
    Ok(Json(ApiResponse::success(offers)))
}

pub async fn material_price_history(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Query(params): Query<PriceHistoryParams>,
) -> ApiResult<Vec<price_history::Model>> {
    let entries = state
        .services
        .price_history
        .list_for_material(&ctx, id, params.supplier_id)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

pub async fn material_price_summary(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Query(params): Query<PriceSummaryParams>,
) -> ApiResult<Vec<SupplierPriceSummary>> {
    let summary = state
        .services
        .price_history
        .summarize_material(&ctx, id, params.currency, params.exchange_rate)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub fn material_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route("/search", get(search_materials))
        .route(
            "/:id",
            get(get_material).put(update_material).delete(delete_material),
        )
        .route("/:id/suppliers", get(material_suppliers))
        .route("/:id/price-history", get(material_price_history))
        .route("/:id/price-summary", get(material_price_summary))
}
