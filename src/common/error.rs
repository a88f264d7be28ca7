// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Erro único da aplicação. Os serviços devolvem sempre `AppError`,
// e a conversão para HTTP acontece apenas em `into_response`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Telefone já registrado")]
    PhoneAlreadyRegistered,

    #[error("Nenhum usuário com esse telefone")]
    NoSuchPrincipal,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Usuário bloqueado")]
    PrincipalBlocked,

    #[error("Token ausente ou malformado")]
    NotAuthenticated,

    #[error("Token não encontrado")]
    NoSuchUser,

    #[error("Token expirado")]
    Expired,

    #[error("Acesso negado")]
    Unauthorized,

    #[error("Cliente {0} não encontrado")]
    CustomerNotFound(i64),

    #[error("Produto {0} não encontrado")]
    ProductNotFound(i64),

    #[error("Venda {0} não encontrada")]
    SaleNotFound(i64),

    #[error("A venda precisa de pelo menos uma posição")]
    EmptySale,

    #[error("Estoque insuficiente para o produto {product_id}: disponível {available}, pedido {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("Produto {0} inativo")]
    InactiveProduct(i64),

    #[error("Tempo limite da requisição excedido")]
    Timeout,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Fonte de aleatoriedade indisponível: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalError(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::InternalError(e.to_string())
    }
}

impl AppError {
    /// Erros que indicam falha da infraestrutura, e não do chamador.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::BcryptError(_)
                | AppError::RandomSource(_)
                | AppError::InternalError(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InsufficientStock { product_id, available, requested } => {
                let body = Json(json!({
                    "error": "Estoque insuficiente.",
                    "productId": product_id,
                    "available": available,
                    "requested": requested,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::PhoneAlreadyRegistered => (StatusCode::CONFLICT, "Este telefone já está em uso.".to_string()),
            AppError::NoSuchPrincipal => (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Telefone ou senha inválidos.".to_string()),
            AppError::PrincipalBlocked => (StatusCode::FORBIDDEN, "Usuário bloqueado.".to_string()),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.".to_string()),
            AppError::NoSuchUser => (StatusCode::UNAUTHORIZED, "Token de autenticação desconhecido.".to_string()),
            AppError::Expired => (StatusCode::UNAUTHORIZED, "Token de autenticação expirado.".to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Você não tem permissão para realizar esta ação.".to_string()),
            ref e @ (AppError::CustomerNotFound(_) | AppError::ProductNotFound(_) | AppError::SaleNotFound(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            AppError::EmptySale => (StatusCode::BAD_REQUEST, "A venda precisa de pelo menos uma posição.".to_string()),
            ref e @ AppError::InactiveProduct(_) => (StatusCode::CONFLICT, e.to_string()),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "A operação excedeu o tempo limite.".to_string()),

            // Todos os outros erros (DatabaseError, InternalError, ...) viram 500.
            // O detalhe vai para o log, nunca para o cliente.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn database_errors_do_not_leak_details() {
        let (status, body) = body_of(AppError::DatabaseError(sqlx::Error::Protocol(
            "relation \"principals\" does not exist".into(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("principals"));
    }

    #[tokio::test]
    async fn insufficient_stock_reports_quantities() {
        let (status, body) = body_of(AppError::InsufficientStock {
            product_id: 7,
            available: 2,
            requested: 5,
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["productId"], 7);
        assert_eq!(body["available"], 2);
    }

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(AppError::Expired.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotAuthenticated.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.into_response().status(), StatusCode::FORBIDDEN);
    }
}
