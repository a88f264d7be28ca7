// src/services/auth.rs

use std::{collections::BTreeSet, sync::Arc};

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};

use crate::{
    common::{
        context::RequestContext,
        error::AppError,
        random::{generate_token, is_well_formed, RandomSource},
    },
    db::{PrincipalStore, TokenStore},
    models::auth::{
        AuthenticatedPrincipal, NewPrincipal, Principal, PrincipalKind, Role, TokenStatusResponse,
    },
};

#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// `None` emite tokens sem expiração.
    pub token_ttl: Option<Duration>,
    pub bcrypt_cost: u32,
}

/// Emissão e validação de tokens opacos, mais o cadastro de principais.
#[derive(Clone)]
pub struct AuthService {
    principals: Arc<dyn PrincipalStore>,
    tokens: Arc<dyn TokenStore>,
    random: Arc<dyn RandomSource>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        tokens: Arc<dyn TokenStore>,
        random: Arc<dyn RandomSource>,
        settings: AuthSettings,
    ) -> Self {
        Self { principals, tokens, random, settings }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.settings.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn register(
        &self,
        ctx: &RequestContext,
        kind: PrincipalKind,
        name: &str,
        phone: &str,
        password: &str,
        roles: BTreeSet<Role>,
    ) -> Result<Principal, AppError> {
        let password_hash = ctx.bound(self.hash_password(password)).await?;
        let new = NewPrincipal {
            kind,
            name: name.to_string(),
            phone: phone.to_string(),
            password_hash,
            roles,
        };
        let principal = ctx.bound(self.principals.create(&new)).await?;

        tracing::info!(id = principal.id, kind = %kind, "👤 Novo principal registrado");
        Ok(principal)
    }

    pub async fn register_customer(
        &self,
        ctx: &RequestContext,
        name: &str,
        phone: &str,
        password: &str,
    ) -> Result<Principal, AppError> {
        self.register(ctx, PrincipalKind::Customer, name, phone, password, BTreeSet::new())
            .await
    }

    pub async fn register_manager(
        &self,
        ctx: &RequestContext,
        name: &str,
        phone: &str,
        password: &str,
        roles: BTreeSet<Role>,
    ) -> Result<Principal, AppError> {
        self.register(ctx, PrincipalKind::Manager, name, phone, password, roles)
            .await
    }

    /// Cria o primeiro administrador, se ainda não existir um gerente com esse telefone.
    pub async fn ensure_bootstrap_admin(
        &self,
        ctx: &RequestContext,
        phone: &str,
        password: &str,
    ) -> Result<Option<Principal>, AppError> {
        let existing = ctx
            .bound(self.principals.find_by_phone(PrincipalKind::Manager, phone))
            .await?;
        if existing.is_some() {
            return Ok(None);
        }
        let admin = self
            .register_manager(ctx, "Administrador", phone, password, BTreeSet::from([Role::Admin]))
            .await?;
        Ok(Some(admin))
    }

    /// Verifica telefone + senha e grava um token novo para o principal.
    /// Tokens anteriores continuam válidos.
    pub async fn issue_token(
        &self,
        ctx: &RequestContext,
        kind: PrincipalKind,
        phone: &str,
        password: &str,
    ) -> Result<String, AppError> {
        let principal = ctx
            .bound(self.principals.find_by_phone(kind, phone))
            .await?
            .ok_or(AppError::NoSuchPrincipal)?;

        let password_clone = password.to_owned();
        let password_hash_clone = principal.password_hash.clone();

        // Executa a verificação em um thread separado (bcrypt compara em tempo constante)
        let is_password_valid = ctx
            .bound(async move {
                tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
                    .map_err(AppError::from)
            })
            .await?;

        if !is_password_valid {
            tracing::warn!(id = principal.id, kind = %kind, "Senha inválida no login");
            return Err(AppError::InvalidCredentials);
        }
        if !principal.active {
            return Err(AppError::PrincipalBlocked);
        }

        let token = generate_token(self.random.as_ref())?;
        let issued_at = Utc::now();
        let expires_at = self.settings.token_ttl.map(|ttl| issued_at + ttl);

        ctx.bound(self.tokens.insert(&token, principal.id, issued_at, expires_at))
            .await?;

        tracing::info!(id = principal.id, kind = %kind, "🔑 Token emitido");
        Ok(token)
    }

    /// Resolve um bearer token para o principal dono dele.
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<AuthenticatedPrincipal, AppError> {
        if token.is_empty() || !is_well_formed(token) {
            return Err(AppError::NotAuthenticated);
        }

        let record = ctx
            .bound(self.tokens.find(token))
            .await?
            .ok_or(AppError::NoSuchUser)?;

        if record.is_expired_at(Utc::now()) {
            return Err(AppError::Expired);
        }

        Ok(AuthenticatedPrincipal {
            id: record.principal_id,
            kind: record.kind,
        })
    }

    /// Versão "status" da autenticação, para o endpoint de validação de tokens de cliente.
    pub async fn token_status(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<TokenStatusResponse, AppError> {
        match self.authenticate(ctx, token).await {
            Ok(principal) if principal.kind == PrincipalKind::Customer => {
                Ok(TokenStatusResponse::ok(principal.id))
            }
            Ok(_) | Err(AppError::NotAuthenticated) | Err(AppError::NoSuchUser) => {
                Ok(TokenStatusResponse::fail("not found"))
            }
            Err(AppError::Expired) => Ok(TokenStatusResponse::fail("expired")),
            Err(e) => Err(e),
        }
    }

    /// Logout: apaga o token. Apagar um token desconhecido não é erro.
    pub async fn revoke_token(&self, ctx: &RequestContext, token: &str) -> Result<(), AppError> {
        let removed = ctx.bound(self.tokens.delete(token)).await?;
        if !removed {
            tracing::debug!("Logout de um token que já não existia");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::random::{testing::BrokenRandom, OsRandom},
        db::MemoryStore,
    };

    fn settings(token_ttl: Option<Duration>) -> AuthSettings {
        AuthSettings { token_ttl, bcrypt_cost: 4 }
    }

    fn service(store: &MemoryStore, token_ttl: Option<Duration>) -> AuthService {
        AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(OsRandom),
            settings(token_ttl),
        )
    }

    fn ctx() -> RequestContext {
        RequestContext::with_timeout(std::time::Duration::from_secs(10))
    }

    #[tokio::test]
    async fn issued_token_authenticates_as_same_principal() {
        let store = MemoryStore::new();
        let auth = service(&store, Some(Duration::hours(1)));
        let customer = auth
            .register_customer(&ctx(), "Ana", "+100", "secret-1")
            .await
            .unwrap();

        let token = auth
            .issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1")
            .await
            .unwrap();
        let principal = auth.authenticate(&ctx(), &token).await.unwrap();

        assert_eq!(principal.id, customer.id);
        assert_eq!(principal.kind, PrincipalKind::Customer);
    }

    #[tokio::test]
    async fn each_login_adds_a_token_and_old_ones_stay_valid() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();

        let first = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await.unwrap();
        let second = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.token_count().await, 2);
        assert!(auth.authenticate(&ctx(), &first).await.is_ok());
        assert!(auth.authenticate(&ctx(), &second).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_phone_and_wrong_password_are_distinguished() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();

        let unknown = auth.issue_token(&ctx(), PrincipalKind::Customer, "+999", "secret-1").await;
        assert!(matches!(unknown, Err(AppError::NoSuchPrincipal)));

        let wrong = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "nope-nope").await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

        // Cliente não faz login como gerente
        let wrong_kind = auth.issue_token(&ctx(), PrincipalKind::Manager, "+100", "secret-1").await;
        assert!(matches!(wrong_kind, Err(AppError::NoSuchPrincipal)));
        assert_eq!(store.token_count().await, 0);
    }

    #[tokio::test]
    async fn broken_random_source_issues_no_token() {
        let store = MemoryStore::new();
        let auth = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(BrokenRandom),
            settings(None),
        );
        auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();

        let result = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await;

        assert!(matches!(result, Err(ref e) if e.is_internal()));
        assert_eq!(store.token_count().await, 0);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        let customer = auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();

        let token = "ab".repeat(32);
        let issued_at = Utc::now() - Duration::hours(2);
        store
            .put_token(&token, customer.id, issued_at, Some(issued_at + Duration::hours(1)))
            .await;

        let result = auth.authenticate(&ctx(), &token).await;
        assert!(matches!(result, Err(AppError::Expired)));
    }

    #[tokio::test]
    async fn token_expiring_later_is_accepted() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        let customer = auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();

        let token = "cd".repeat(32);
        store
            .put_token(&token, customer.id, Utc::now(), Some(Utc::now() + Duration::milliseconds(500)))
            .await;

        assert_eq!(auth.authenticate(&ctx(), &token).await.unwrap().id, customer.id);
    }

    #[tokio::test]
    async fn malformed_and_unknown_tokens() {
        let store = MemoryStore::new();
        let auth = service(&store, None);

        assert!(matches!(auth.authenticate(&ctx(), "").await, Err(AppError::NotAuthenticated)));
        assert!(matches!(auth.authenticate(&ctx(), "not-a-token").await, Err(AppError::NotAuthenticated)));
        assert!(matches!(auth.authenticate(&ctx(), &"0".repeat(64)).await, Err(AppError::NoSuchUser)));
    }

    #[tokio::test]
    async fn blocked_principal_cannot_log_in() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        let customer = auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();
        PrincipalStore::set_active(&store, PrincipalKind::Customer, customer.id, false).await.unwrap();

        let result = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await;
        assert!(matches!(result, Err(AppError::PrincipalBlocked)));
    }

    #[tokio::test]
    async fn stored_token_of_blocked_principal_stops_authenticating() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        let customer = auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();
        let token = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await.unwrap();

        // Bloqueio sem apagar os tokens: o token continua gravado
        PrincipalStore::set_active(&store, PrincipalKind::Customer, customer.id, false).await.unwrap();
        assert_eq!(store.token_count().await, 1);

        assert!(matches!(auth.authenticate(&ctx(), &token).await, Err(AppError::NoSuchUser)));
        let status = auth.token_status(&ctx(), &token).await.unwrap();
        assert_eq!(status.status, "fail");

        // Desbloqueado, o mesmo token volta a valer
        PrincipalStore::set_active(&store, PrincipalKind::Customer, customer.id, true).await.unwrap();
        assert_eq!(auth.authenticate(&ctx(), &token).await.unwrap().id, customer.id);
    }

    #[tokio::test]
    async fn uppercase_token_is_rejected_without_lookup() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        let customer = auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();
        let token = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await.unwrap();

        let shouted = token.to_ascii_uppercase();
        assert!(matches!(auth.authenticate(&ctx(), &shouted).await, Err(AppError::NotAuthenticated)));
        assert_eq!(auth.authenticate(&ctx(), &token).await.unwrap().id, customer.id);
    }

    #[tokio::test]
    async fn token_status_and_logout() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        let customer = auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();
        let token = auth.issue_token(&ctx(), PrincipalKind::Customer, "+100", "secret-1").await.unwrap();

        let status = auth.token_status(&ctx(), &token).await.unwrap();
        assert_eq!(status.status, "ok");
        assert_eq!(status.customer_id, Some(customer.id));

        auth.revoke_token(&ctx(), &token).await.unwrap();
        let status = auth.token_status(&ctx(), &token).await.unwrap();
        assert_eq!(status.status, "fail");
        assert_eq!(status.reason.as_deref(), Some("not found"));

        // Segundo logout do mesmo token não é erro
        auth.revoke_token(&ctx(), &token).await.unwrap();
    }

    #[tokio::test]
    async fn bootstrap_admin_is_idempotent() {
        let store = MemoryStore::new();
        let auth = service(&store, None);

        let created = auth.ensure_bootstrap_admin(&ctx(), "+1", "admin-pass").await.unwrap();
        let again = auth.ensure_bootstrap_admin(&ctx(), "+1", "admin-pass").await.unwrap();

        let admin = created.unwrap();
        assert!(admin.role_set().contains(&Role::Admin));
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let store = MemoryStore::new();
        let auth = service(&store, None);
        auth.register_customer(&ctx(), "Ana", "+100", "secret-1").await.unwrap();

        let dup = auth.register_customer(&ctx(), "Bia", "+100", "secret-2").await;
        assert!(matches!(dup, Err(AppError::PhoneAlreadyRegistered)));
    }
}
