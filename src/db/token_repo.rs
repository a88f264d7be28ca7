// src/db/token_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{common::error::AppError, models::auth::TokenRecord};

/// Tokens opacos emitidos no login (tabela `tokens`).
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(
        &self,
        token: &str,
        principal_id: i64,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;

    /// Tokens cujo dono está bloqueado contam como inexistentes.
    async fn find(&self, token: &str) -> Result<Option<TokenRecord>, AppError>;

    /// Remove um token. Devolve `false` se ele não existia.
    async fn delete(&self, token: &str) -> Result<bool, AppError>;

    async fn delete_for_principal(&self, principal_id: i64) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn insert(
        &self,
        token: &str,
        principal_id: i64,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tokens (token, principal_id, issued_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(token)
        .bind(principal_id)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<TokenRecord>, AppError> {
        // O JOIN traz o tipo do dono junto e descarta donos bloqueados
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT t.token, t.principal_id, p.kind, t.issued_at, t.expires_at
            FROM tokens t
            JOIN principals p ON p.id = t.principal_id AND p.active
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_principal(&self, principal_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE principal_id = $1")
            .bind(principal_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
