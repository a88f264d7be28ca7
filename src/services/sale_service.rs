// src/services/sale_service.rs

use std::sync::Arc;

use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{context::RequestContext, error::AppError},
    db::{PrincipalStore, SaleStore, SaleTransaction},
    models::{
        auth::PrincipalKind,
        sales::{Sale, SaleLineRequest},
    },
};

#[derive(Clone)]
pub struct SaleService {
    sales: Arc<dyn SaleStore>,
    principals: Arc<dyn PrincipalStore>,
}

impl SaleService {
    pub fn new(sales: Arc<dyn SaleStore>, principals: Arc<dyn PrincipalStore>) -> Self {
        Self { sales, principals }
    }

    /// Grava uma venda inteira numa única transação: ou todas as posições
    /// baixam estoque, ou nada muda.
    pub async fn record_sale(
        &self,
        ctx: &RequestContext,
        manager_id: i64,
        customer_id: i64,
        lines: &[SaleLineRequest],
    ) -> Result<Sale, AppError> {
        if lines.is_empty() {
            return Err(AppError::EmptySale);
        }
        if lines.iter().any(|line| line.qty <= 0) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "lines",
                ValidationError::new("range").with_message("A quantidade deve ser maior que zero.".into()),
            );
            return Err(AppError::ValidationError(errors));
        }

        // Checado antes de abrir a transação
        let customer = ctx.bound(self.principals.find_by_id(customer_id)).await?;
        match customer {
            Some(c) if c.kind == PrincipalKind::Customer && c.active => {}
            _ => return Err(AppError::CustomerNotFound(customer_id)),
        }

        // Se o deadline estourar, o futuro é descartado junto com a transação
        ctx.bound(self.run_sale_transaction(manager_id, customer_id, lines))
            .await
    }

    async fn run_sale_transaction(
        &self,
        manager_id: i64,
        customer_id: i64,
        lines: &[SaleLineRequest],
    ) -> Result<Sale, AppError> {
        let mut tx = self.sales.begin().await?;

        match write_sale(&mut tx, manager_id, customer_id, lines).await {
            Ok(sale) => {
                tx.commit().await?;
                tracing::info!(
                    sale_id = sale.id,
                    manager_id,
                    customer_id,
                    total = sale.total(),
                    "🧾 Venda registrada"
                );
                Ok(sale)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Falha no rollback da venda: {:?}", rollback_err);
                }
                tracing::warn!(manager_id, customer_id, "Venda cancelada: {}", e);
                Err(e)
            }
        }
    }

    pub async fn list_for_manager(&self, ctx: &RequestContext, manager_id: i64) -> Result<Vec<Sale>, AppError> {
        ctx.bound(self.sales.list_for_manager(manager_id)).await
    }

    pub async fn total_for_manager(&self, ctx: &RequestContext, manager_id: i64) -> Result<i64, AppError> {
        ctx.bound(self.sales.total_for_manager(manager_id)).await
    }

    pub async fn get(&self, ctx: &RequestContext, sale_id: i64) -> Result<Sale, AppError> {
        ctx.bound(self.sales.find_by_id(sale_id))
            .await?
            .ok_or(AppError::SaleNotFound(sale_id))
    }

    pub async fn purchases_for_customer(
        &self,
        ctx: &RequestContext,
        customer_id: i64,
    ) -> Result<Vec<Sale>, AppError> {
        ctx.bound(self.sales.list_for_customer(customer_id)).await
    }
}

// Cabeçalho primeiro, depois cada posição em ordem. O preço unitário vem
// sempre da linha travada do produto.
async fn write_sale(
    tx: &mut Box<dyn SaleTransaction>,
    manager_id: i64,
    customer_id: i64,
    lines: &[SaleLineRequest],
) -> Result<Sale, AppError> {
    let mut sale = tx.insert_sale(manager_id, customer_id).await?;
    let mut total: i64 = 0;

    for line in lines {
        let stock = tx
            .lock_product(line.product_id)
            .await?
            .ok_or(AppError::ProductNotFound(line.product_id))?;

        if !stock.active {
            return Err(AppError::InactiveProduct(stock.id));
        }
        if stock.qty < line.qty {
            return Err(AppError::InsufficientStock {
                product_id: stock.id,
                available: stock.qty,
                requested: line.qty,
            });
        }

        // O total da venda precisa caber em i64 para os relatórios
        total = stock
            .price
            .checked_mul(line.qty)
            .and_then(|amount| total.checked_add(amount))
            .ok_or_else(|| amount_overflow(stock.id))?;

        tx.decrement_stock(stock.id, line.qty).await?;
        let saved = tx.insert_line(sale.id, stock.id, line.qty, stock.price).await?;
        sale.lines.push(saved);
    }

    Ok(sale)
}

fn amount_overflow(product_id: i64) -> AppError {
    let mut errors = ValidationErrors::new();
    let mut error = ValidationError::new("overflow")
        .with_message("O valor total da venda excede o limite suportado.".into());
    error.add_param("productId".into(), &product_id);
    errors.add("lines", error);
    AppError::ValidationError(errors)
}
