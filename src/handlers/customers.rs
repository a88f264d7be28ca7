// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::{
    common::{context::RequestContext, error::AppError},
    config::AppState,
    middleware::{
        auth::CurrentPrincipal,
        rbac::{AdminRole, RequireRole},
    },
    models::{
        auth::Principal,
        customers::{CustomerListQuery, UpdateCustomerPayload},
        sales::Sale,
    },
};

// GET /api/managers/customers
#[utoipa::path(
    get,
    path = "/api/managers/customers",
    tag = "Customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Lista de clientes", body = Vec<Principal>),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Vec<Principal>>, AppError> {
    let customers = app_state.customer_service.list(&ctx, query.active).await?;
    Ok(Json(customers))
}

// GET /api/managers/customers/{id}
#[utoipa::path(
    get,
    path = "/api/managers/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Principal),
        (status = 403, description = "Requer papel ADMIN"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_token" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Principal>, AppError> {
    Ok(Json(app_state.customer_service.get(&ctx, id).await?))
}

// PUT /api/managers/customers/{id}
#[utoipa::path(
    put,
    path = "/api/managers/customers/{id}",
    tag = "Customers",
    request_body = UpdateCustomerPayload,
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Principal),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<Json<Principal>, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .update(&ctx, id, &payload.name, &payload.phone)
        .await?;
    Ok(Json(customer))
}

// DELETE /api/managers/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/managers/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente removido", body = Principal),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn remove_customer(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Principal>, AppError> {
    Ok(Json(app_state.customer_service.remove(&ctx, id).await?))
}

// POST /api/managers/customers/{id}/block
#[utoipa::path(
    post,
    path = "/api/managers/customers/{id}/block",
    tag = "Customers",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente bloqueado", body = Principal),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn block_customer(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Principal>, AppError> {
    Ok(Json(app_state.customer_service.block(&ctx, id).await?))
}

// DELETE /api/managers/customers/{id}/block
#[utoipa::path(
    delete,
    path = "/api/managers/customers/{id}/block",
    tag = "Customers",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente desbloqueado", body = Principal),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn unblock_customer(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Principal>, AppError> {
    Ok(Json(app_state.customer_service.unblock(&ctx, id).await?))
}

// GET /api/customers/purchases
#[utoipa::path(
    get,
    path = "/api/customers/purchases",
    tag = "Customers",
    responses(
        (status = 200, description = "Compras do cliente autenticado", body = Vec<Sale>)
    ),
    security(("api_token" = []))
)]
pub async fn my_purchases(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    CurrentPrincipal(customer): CurrentPrincipal,
) -> Result<Json<Vec<Sale>>, AppError> {
    let purchases = app_state
        .sale_service
        .purchases_for_customer(&ctx, customer.id)
        .await?;
    Ok(Json(purchases))
}
