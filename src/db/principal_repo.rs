// src/db/principal_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::auth::{NewPrincipal, Principal, PrincipalKind},
};

/// Credenciais e cadastro de clientes e gerentes (tabela `principals`).
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn create(&self, new: &NewPrincipal) -> Result<Principal, AppError>;

    async fn find_by_phone(&self, kind: PrincipalKind, phone: &str) -> Result<Option<Principal>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, AppError>;

    async fn list(&self, kind: PrincipalKind, only_active: bool) -> Result<Vec<Principal>, AppError>;

    async fn update_profile(
        &self,
        kind: PrincipalKind,
        id: i64,
        name: &str,
        phone: &str,
    ) -> Result<Option<Principal>, AppError>;

    async fn set_active(&self, kind: PrincipalKind, id: i64, active: bool) -> Result<Option<Principal>, AppError>;
}

// O repositório de principais, responsável por todas as interações com a tabela 'principals'
#[derive(Clone)]
pub struct PrincipalRepository {
    pool: PgPool,
}

impl PrincipalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Converte violação de chave única (kind, phone) em um erro mais amigável
fn map_phone_conflict(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::PhoneAlreadyRegistered;
        }
    }
    AppError::DatabaseError(e)
}

#[async_trait]
impl PrincipalStore for PrincipalRepository {
    async fn create(&self, new: &NewPrincipal) -> Result<Principal, AppError> {
        sqlx::query_as::<_, Principal>(
            r#"
            INSERT INTO principals (kind, name, phone, password_hash, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.kind)
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.password_hash)
        .bind(new.role_strings())
        .fetch_one(&self.pool)
        .await
        .map_err(map_phone_conflict)
    }

    async fn find_by_phone(&self, kind: PrincipalKind, phone: &str) -> Result<Option<Principal>, AppError> {
        let principal = sqlx::query_as::<_, Principal>("SELECT * FROM principals WHERE kind = $1 AND phone = $2")
            .bind(kind)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(principal)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, AppError> {
        let principal = sqlx::query_as::<_, Principal>("SELECT * FROM principals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(principal)
    }

    async fn list(&self, kind: PrincipalKind, only_active: bool) -> Result<Vec<Principal>, AppError> {
        let principals = sqlx::query_as::<_, Principal>(
            r#"
            SELECT * FROM principals
            WHERE kind = $1 AND (NOT $2 OR active)
            ORDER BY id
            LIMIT 500
            "#,
        )
        .bind(kind)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(principals)
    }

    async fn update_profile(
        &self,
        kind: PrincipalKind,
        id: i64,
        name: &str,
        phone: &str,
    ) -> Result<Option<Principal>, AppError> {
        sqlx::query_as::<_, Principal>(
            r#"
            UPDATE principals SET name = $1, phone = $2
            WHERE id = $3 AND kind = $4
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_phone_conflict)
    }

    async fn set_active(&self, kind: PrincipalKind, id: i64, active: bool) -> Result<Option<Principal>, AppError> {
        let principal = sqlx::query_as::<_, Principal>(
            "UPDATE principals SET active = $1 WHERE id = $2 AND kind = $3 RETURNING *",
        )
        .bind(active)
        .bind(id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(principal)
    }
}
