// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use validator::Validate;

use crate::{
    common::{context::RequestContext, error::AppError},
    config::AppState,
    middleware::rbac::{AdminRole, RequireRole},
    models::auth::{
        AuthResponse, LoginPayload, Principal, PrincipalKind, RegisterCustomerPayload,
        RegisterManagerPayload, TokenPayload, TokenStatusResponse,
    },
};

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Auth",
    request_body = RegisterCustomerPayload,
    responses(
        (status = 201, description = "Cliente registrado", body = Principal),
        (status = 409, description = "Telefone já registrado")
    )
)]
pub async fn register_customer(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<RegisterCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .auth_service
        .register_customer(&ctx, &payload.name, &payload.phone, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// POST /api/customers/token
#[utoipa::path(
    post,
    path = "/api/customers/token",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido", body = AuthResponse),
        (status = 401, description = "Senha inválida"),
        (status = 404, description = "Telefone desconhecido")
    )
)]
pub async fn customer_token(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .issue_token(&ctx, PrincipalKind::Customer, &payload.login, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// POST /api/managers/token
#[utoipa::path(
    post,
    path = "/api/managers/token",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido", body = AuthResponse),
        (status = 401, description = "Senha inválida"),
        (status = 404, description = "Telefone desconhecido")
    )
)]
pub async fn manager_token(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .issue_token(&ctx, PrincipalKind::Manager, &payload.login, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// POST /api/customers/token/validate
// Sempre 200: o resultado vai no corpo ("ok" ou "fail" + motivo).
#[utoipa::path(
    post,
    path = "/api/customers/token/validate",
    tag = "Auth",
    request_body = TokenPayload,
    responses(
        (status = 200, description = "Estado do token", body = TokenStatusResponse)
    )
)]
pub async fn validate_token(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<TokenPayload>,
) -> Result<Json<TokenStatusResponse>, AppError> {
    let status = app_state.auth_service.token_status(&ctx, &payload.token).await?;
    Ok(Json(status))
}

// DELETE /api/auth/token
#[utoipa::path(
    delete,
    path = "/api/auth/token",
    tag = "Auth",
    responses(
        (status = 204, description = "Token revogado")
    ),
    security(("api_token" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<StatusCode, AppError> {
    app_state
        .auth_service
        .revoke_token(&ctx, auth.token().trim())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/managers
#[utoipa::path(
    post,
    path = "/api/managers",
    tag = "Auth",
    request_body = RegisterManagerPayload,
    responses(
        (status = 201, description = "Gerente registrado", body = Principal),
        (status = 403, description = "Requer papel ADMIN")
    ),
    security(("api_token" = []))
)]
pub async fn register_manager(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    _guard: RequireRole<AdminRole>,
    Json(payload): Json<RegisterManagerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let manager = app_state
        .auth_service
        .register_manager(
            &ctx,
            &payload.name,
            &payload.phone,
            &payload.password,
            payload.roles.iter().copied().collect(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(manager)))
}
