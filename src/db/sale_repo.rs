// src/db/sale_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    models::sales::{LockedStock, Sale, SaleLine},
};

/// Vendas e suas posições.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Abre uma unidade atômica de gravação. Se ela for descartada sem
    /// `commit`, nada do que foi feito dentro dela fica visível.
    async fn begin(&self) -> Result<Box<dyn SaleTransaction>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Sale>, AppError>;

    async fn list_for_manager(&self, manager_id: i64) -> Result<Vec<Sale>, AppError>;

    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Sale>, AppError>;

    /// Soma de `qty * unit_price` de todas as vendas do gerente (0 se nenhuma).
    async fn total_for_manager(&self, manager_id: i64) -> Result<i64, AppError>;
}

/// Passos de uma venda dentro da transação. A ordem e as regras de negócio
/// ficam no `SaleService`; aqui só existe acesso a dados.
#[async_trait]
pub trait SaleTransaction: Send {
    async fn insert_sale(&mut self, manager_id: i64, customer_id: i64) -> Result<Sale, AppError>;

    /// Lê o produto travando a linha contra vendas concorrentes até o fim da transação.
    async fn lock_product(&mut self, product_id: i64) -> Result<Option<LockedStock>, AppError>;

    async fn decrement_stock(&mut self, product_id: i64, qty: i64) -> Result<(), AppError>;

    async fn insert_line(
        &mut self,
        sale_id: i64,
        product_id: i64,
        qty: i64,
        unit_price: i64,
    ) -> Result<SaleLine, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SaleRepository {
    pool: PgPool,
}

impl SaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca as posições de várias vendas numa única query e distribui por venda
    async fn attach_lines(&self, mut sales: Vec<Sale>) -> Result<Vec<Sale>, AppError> {
        if sales.is_empty() {
            return Ok(sales);
        }
        let ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT * FROM sale_lines WHERE sale_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<i64, Vec<SaleLine>> = HashMap::new();
        for line in lines {
            by_sale.entry(line.sale_id).or_default().push(line);
        }
        for sale in &mut sales {
            sale.lines = by_sale.remove(&sale.id).unwrap_or_default();
        }
        Ok(sales)
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn begin(&self) -> Result<Box<dyn SaleTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSaleTransaction { tx }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Sale>, AppError> {
        let header = sqlx::query_as::<_, Sale>(
            "SELECT id, manager_id, customer_id, created_at FROM sales WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(sale) => Ok(self.attach_lines(vec![sale]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_for_manager(&self, manager_id: i64) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, manager_id, customer_id, created_at FROM sales
            WHERE manager_id = $1
            ORDER BY id DESC
            LIMIT 500
            "#,
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_lines(sales).await
    }

    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, manager_id, customer_id, created_at FROM sales
            WHERE customer_id = $1
            ORDER BY id DESC
            LIMIT 500
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_lines(sales).await
    }

    async fn total_for_manager(&self, manager_id: i64) -> Result<i64, AppError> {
        // Soma em NUMERIC e satura em i64::MAX antes do cast
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT LEAST(
                COALESCE(SUM(sl.qty::NUMERIC * sl.unit_price), 0),
                9223372036854775807
            )::BIGINT
            FROM sale_lines sl
            JOIN sales s ON s.id = sl.sale_id
            WHERE s.manager_id = $1
            "#,
        )
        .bind(manager_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

/// Transação Postgres. O `Drop` do `sqlx::Transaction` faz rollback
/// automático se `commit` não for chamado (inclusive em timeout).
pub struct PgSaleTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SaleTransaction for PgSaleTransaction {
    async fn insert_sale(&mut self, manager_id: i64, customer_id: i64) -> Result<Sale, AppError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (manager_id, customer_id)
            VALUES ($1, $2)
            RETURNING id, manager_id, customer_id, created_at
            "#,
        )
        .bind(manager_id)
        .bind(customer_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(sale)
    }

    async fn lock_product(&mut self, product_id: i64) -> Result<Option<LockedStock>, AppError> {
        let stock = sqlx::query_as::<_, LockedStock>(
            "SELECT id, price, qty, active FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(stock)
    }

    async fn decrement_stock(&mut self, product_id: i64, qty: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE products SET qty = qty - $1 WHERE id = $2")
            .bind(qty)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_line(
        &mut self,
        sale_id: i64,
        product_id: i64,
        qty: i64,
        unit_price: i64,
    ) -> Result<SaleLine, AppError> {
        let line = sqlx::query_as::<_, SaleLine>(
            r#"
            INSERT INTO sale_lines (sale_id, product_id, qty, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(qty)
        .bind(unit_price)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(line)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
