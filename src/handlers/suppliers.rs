use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, no_content_response, SearchParams};
use crate::{
    auth::AccountContext,
    commands::suppliers::SupplierInput,
    errors::ServiceError,
    handlers::AppState,
    models::{supplier, supplier_material, SupplierStatus},
    services::suppliers::{SuppliedMaterial, SupplierMaterialInput, SupplierUpdateOutcome},
    ApiResponse, ApiResult,
};

#[derive(Debug, Default, Deserialize)]
pub struct SupplierListParams {
    pub status: Option<SupplierStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SupplierStatusRequest {
    pub status: SupplierStatus,
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<SupplierListParams>,
) -> ApiResult<Vec<supplier::Model>> {
    let suppliers = state.services.suppliers.list(&ctx, params.status).await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

pub async fn search_suppliers(
    State(state): State<AppState>,
    ctx: AccountContext,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<supplier::Model>> {
    let suppliers = state.services.suppliers.search(&ctx, &params.q).await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<supplier::Model> {
    let supplier = state.services.suppliers.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    ctx: AccountContext,
    Json(payload): Json<SupplierInput>,
) -> Result<Response, ServiceError> {
    let supplier = state.services.suppliers.create(&ctx, payload).await?;
    Ok(created_response(supplier))
}

/// Replaces the supplier; the response lists documents archived by a deactivation
pub async fn update_supplier(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierInput>,
) -> ApiResult<SupplierUpdateOutcome> {
    let outcome = state.services.suppliers.update(&ctx, id, payload).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn set_supplier_status(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierStatusRequest>,
) -> ApiResult<SupplierUpdateOutcome> {
    let outcome = state
        .services
        .suppliers
        .set_status(&ctx, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.suppliers.delete(&ctx, id).await?;
    Ok(no_content_response())
}

pub async fn list_supplier_materials(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<SuppliedMaterial>> {
    let materials = state.services.suppliers.list_materials(&ctx, id).await?;
    Ok(Json(ApiResponse::success(materials)))
}

pub async fn upsert_supplier_material(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierMaterialInput>,
) -> ApiResult<supplier_material::Model> {
    let link = state
        .services
        .suppliers
        .upsert_material(&ctx, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(link)))
}

pub async fn remove_supplier_material(
    State(state): State<AppState>,
    ctx: AccountContext,
    Path((id, material_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ServiceError> {
    state
        .services
        .suppliers
        .remove_material(&ctx, id, material_id)
        .await?;
    Ok(no_content_response())
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/search", get(search_suppliers))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/:id/status", put(set_supplier_status))
        .route(
            "/:id/materials",
            get(list_supplier_materials).post(upsert_supplier_material),
        )
        .route("/:id/materials/:material_id", delete(remove_supplier_material))
}
