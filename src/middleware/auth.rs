// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::{context::RequestContext, error::AppError},
    config::AppState,
    models::auth::{AuthenticatedPrincipal, PrincipalKind},
};

/// Extrai o token de `Authorization: Bearer <token>`. Cabeçalho ausente ou
/// em outro formato vira string vazia, que a autenticação rejeita.
pub fn bearer_token(headers: &HeaderMap) -> String {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .unwrap_or_default()
}

async fn authenticate_request(
    app_state: &AppState,
    mut request: Request,
    next: Next,
    required_kind: Option<PrincipalKind>,
) -> Result<Response, AppError> {
    let ctx = RequestContext::with_timeout(app_state.config.request_timeout);
    let principal = app_state
        .auth_service
        .authenticate(&ctx, &bearer_token(request.headers()))
        .await?;

    if let Some(kind) = required_kind {
        if principal.kind != kind {
            return Err(AppError::Unauthorized);
        }
    }

    // Disponibiliza o principal e o deadline para os handlers
    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(CurrentPrincipal(principal));
    Ok(next.run(request).await)
}

/// Qualquer principal autenticado (cliente ou gerente).
pub async fn auth_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate_request(&app_state, request, next, None).await
}

pub async fn customer_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate_request(&app_state, request, next, Some(PrincipalKind::Customer)).await
}

pub async fn manager_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate_request(&app_state, request, next, Some(PrincipalKind::Manager)).await
}

// Extrator para obter o principal autenticado diretamente nos handlers
#[derive(Debug, Clone, Copy)]
pub struct CurrentPrincipal(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentPrincipal>()
            .copied()
            .ok_or(AppError::NotAuthenticated)
    }
}
