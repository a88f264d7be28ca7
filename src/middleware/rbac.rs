// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::{context::RequestContext, error::AppError},
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::auth::Role,
};

/// 1. O Trait que define qual papel uma rota exige
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// 2. O Extractor (Guardião). Deve vir depois de um guard de autenticação.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A. Extrai o principal
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        let ctx = RequestContext::from_request_parts(parts, state).await?;

        // B. Verifica no banco (sempre o estado atual, nada em cache)
        app_state
            .rbac_service
            .require_role(&ctx, principal.id, T::role())
            .await?;

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn role() -> Role { Role::Admin }
}
