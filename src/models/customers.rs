// src/models/customers.rs

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// Alteração de cadastro de um cliente feita pelo administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 3, max = 32, message = "O telefone fornecido é inválido."))]
    pub phone: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CustomerListQuery {
    /// Quando `true`, lista apenas clientes ativos.
    #[serde(default)]
    pub active: bool,
}
