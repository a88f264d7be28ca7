// src/models/sales.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- Venda (cabeçalho + posições) ---
// Imutável depois de gravada: não existe caminho de update/delete.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub manager_id: i64,
    pub customer_id: i64,
    pub created_at: DateTime<Utc>,

    // Preenchido no repositório a partir de `sale_lines`
    #[sqlx(skip)]
    pub lines: Vec<SaleLine>,
}

impl Sale {
    // Saturado em i64::MAX; o registro da venda já recusa totais que não cabem
    pub fn total(&self) -> i64 {
        self.lines
            .iter()
            .map(SaleLine::amount)
            .fold(0i64, i64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub qty: i64,
    // Cópia do preço do produto no momento da venda
    pub unit_price: i64,
}

impl SaleLine {
    pub fn amount(&self) -> i64 {
        self.qty.saturating_mul(self.unit_price)
    }
}

/// Estado do produto lido sob lock durante a venda.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct LockedStock {
    pub id: i64,
    pub price: i64,
    pub qty: i64,
    pub active: bool,
}

// Uma posição pedida. Não existe campo de preço: o preço é sempre o do produto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub product_id: i64,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub qty: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSalePayload {
    pub customer_id: i64,
    #[validate(length(min = 1, message = "A venda precisa de pelo menos uma posição."), nested)]
    pub lines: Vec<SaleLineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotal {
    pub manager_id: i64,
    pub total: i64,
}
