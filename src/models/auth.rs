// src/models/auth.rs

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Mapeia o CREATE TYPE principal_kind do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "principal_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Customer,
    Manager,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::Customer => f.write_str("customer"),
            PrincipalKind::Manager => f.write_str("manager"),
        }
    }
}

/// Marcadores de capacidade de um principal. No banco ficam como TEXT[].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

// Representa um cliente ou gerente vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[schema(example = 1)]
    pub id: i64,
    pub kind: PrincipalKind,
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[schema(example = "+992000000001")]
    pub phone: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// Papéis conhecidos; strings desconhecidas no banco são ignoradas.
    pub fn role_set(&self) -> BTreeSet<Role> {
        self.roles.iter().filter_map(|r| r.parse().ok()).collect()
    }
}

/// Dados para inserir um principal (a senha já chega como hash).
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub kind: PrincipalKind,
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

impl NewPrincipal {
    pub fn role_strings(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}

// Linha da tabela `tokens`, já com o tipo do dono (via JOIN).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRecord {
    pub token: String,
    pub principal_id: i64,
    pub kind: PrincipalKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Resultado tipado da autenticação, válido só durante a requisição atual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub id: i64,
    pub kind: PrincipalKind,
}

// Dados para registro de um novo cliente
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterCustomerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 3, max = 32, message = "O telefone fornecido é inválido."))]
    pub phone: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para registro de um gerente (somente ADMIN)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterManagerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 3, max = 32, message = "O telefone fornecido é inválido."))]
    pub phone: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O login é obrigatório."))]
    pub login: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenPayload {
    pub token: String,
}

// Resposta do endpoint de validação de token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TokenStatusResponse {
    pub fn ok(customer_id: i64) -> Self {
        Self { status: "ok".into(), customer_id: Some(customer_id), reason: None }
    }

    pub fn fail(reason: &'static str) -> Self {
        Self { status: "fail".into(), customer_id: None, reason: Some(reason.into()) }
    }
}
