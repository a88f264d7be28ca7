// src/db/product_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::catalog::{Product, ProductDraft},
};

/// Catálogo de produtos. O estoque só é baixado dentro de uma venda
/// (ver `SaleTransaction`), nunca por aqui.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Product>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, AppError>;

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, AppError>;

    async fn update(&self, id: i64, draft: &ProductDraft) -> Result<Option<Product>, AppError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Product>, AppError>;
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list_active(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE active ORDER BY id LIMIT 500",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, qty)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.qty)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET name = $1, price = $2, qty = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.qty)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET active = $1 WHERE id = $2 RETURNING *",
        )
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }
}
