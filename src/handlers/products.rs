// src/handlers/products.rs

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::{
    common::{context::RequestContext, error::AppError},
    config::AppState,
    middleware::rbac::{AdminRole, RequireRole},
    models::catalog::{Product, SaveProductPayload},
};

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "Produtos ativos", body = Vec<Product>)
    ),
    security(("api_token" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(app_state.catalog_service.list_active(&ctx).await?))
}

// POST /api/managers/products
#[utoipa::path(
    post,
    path = "/api/managers/products",
    tag = "Products",
    request_body = SaveProductPayload,
    responses(
        (status = 200, description = "Produto criado ou atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_token" = []))
)]
pub async fn save_product(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<SaveProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;

    let product = app_state
        .catalog_service
        .save(&ctx, payload.id, &payload.draft())
        .await?;
    Ok(Json(product))
}

// DELETE /api/managers/products/{id}
#[utoipa::path(
    delete,
    path = "/api/managers/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto desativado", body = Product),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn remove_product(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(app_state.catalog_service.remove(&ctx, id).await?))
}
