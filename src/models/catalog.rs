// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- Produto ---
// Preço em unidades menores da moeda (centavos); `qty` nunca fica negativo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Café 500g")]
    pub name: String,
    #[schema(example = 1290)]
    pub price: i64,
    #[schema(example = 40)]
    pub qty: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Campos editáveis de um produto (criação e atualização).
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub price: i64,
    pub qty: i64,
}

// Payload de criação/atualização: sem `id` cria, com `id` atualiza.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveProductPayload {
    pub id: Option<i64>,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(range(min = 0, message = "O preço não pode ser negativo."))]
    pub price: i64,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub qty: i64,
}

impl SaveProductPayload {
    pub fn draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            price: self.price,
            qty: self.qty,
        }
    }
}
