// src/handlers/sales.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{context::RequestContext, error::AppError},
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::sales::{RecordSalePayload, Sale, SalesTotal},
};

// POST /api/managers/sales
#[utoipa::path(
    post,
    path = "/api/managers/sales",
    tag = "Sales",
    request_body = RecordSalePayload,
    responses(
        (status = 201, description = "Venda registrada", body = Sale),
        (status = 404, description = "Cliente ou produto não encontrado"),
        (status = 409, description = "Estoque insuficiente ou produto inativo")
    ),
    security(("api_token" = []))
)]
pub async fn record_sale(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    CurrentPrincipal(manager): CurrentPrincipal,
    Json(payload): Json<RecordSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    if payload.lines.is_empty() {
        return Err(AppError::EmptySale);
    }
    payload.validate()?;

    let sale = app_state
        .sale_service
        .record_sale(&ctx, manager.id, payload.customer_id, &payload.lines)
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

// GET /api/managers/sales
#[utoipa::path(
    get,
    path = "/api/managers/sales",
    tag = "Sales",
    responses(
        (status = 200, description = "Vendas do gerente, mais recentes primeiro", body = Vec<Sale>)
    ),
    security(("api_token" = []))
)]
pub async fn list_my_sales(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    CurrentPrincipal(manager): CurrentPrincipal,
) -> Result<Json<Vec<Sale>>, AppError> {
    Ok(Json(app_state.sale_service.list_for_manager(&ctx, manager.id).await?))
}

// GET /api/managers/sales/total
#[utoipa::path(
    get,
    path = "/api/managers/sales/total",
    tag = "Sales",
    responses(
        (status = 200, description = "Soma de todas as vendas do gerente", body = SalesTotal)
    ),
    security(("api_token" = []))
)]
pub async fn sales_total(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    CurrentPrincipal(manager): CurrentPrincipal,
) -> Result<Json<SalesTotal>, AppError> {
    let total = app_state.sale_service.total_for_manager(&ctx, manager.id).await?;
    Ok(Json(SalesTotal { manager_id: manager.id, total }))
}

// GET /api/managers/sales/{id}
#[utoipa::path(
    get,
    path = "/api/managers/sales/{id}",
    tag = "Sales",
    params(("id" = i64, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda com posições", body = Sale),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_token" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<Sale>, AppError> {
    Ok(Json(app_state.sale_service.get(&ctx, id).await?))
}
