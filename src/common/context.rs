// src/common/context.rs

use std::{future::Future, time::Duration};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tokio::time::Instant;

use crate::{common::error::AppError, config::AppState};

/// Contexto de uma única requisição: o prazo final (deadline) que limita
/// todas as chamadas ao banco feitas em nome dela.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    deadline: Instant,
}

impl RequestContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: Instant::now() + timeout }
    }

    /// Executa `fut` até o deadline. Se o prazo estourar, o futuro é
    /// descartado (uma transação aberta dentro dele sofre rollback no drop).
    pub async fn bound<F, T>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout_at(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("⏱️ Deadline da requisição excedido");
                Err(AppError::Timeout)
            }
        }
    }
}

// O middleware de autenticação já cria o contexto e o coloca nas extensions;
// nas rotas públicas ele nasce aqui, com o timeout configurado.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(*ctx);
        }
        let app_state = AppState::from_ref(state);
        let ctx = RequestContext::with_timeout(app_state.config.request_timeout);
        parts.extensions.insert(ctx);
        Ok(ctx)
    }
}
