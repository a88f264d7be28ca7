// src/services/customer_service.rs

use std::sync::Arc;

use crate::{
    common::{context::RequestContext, error::AppError},
    db::{PrincipalStore, TokenStore},
    models::auth::{Principal, PrincipalKind},
};

#[derive(Clone)]
pub struct CustomerService {
    principals: Arc<dyn PrincipalStore>,
    tokens: Arc<dyn TokenStore>,
}

impl CustomerService {
    pub fn new(principals: Arc<dyn PrincipalStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { principals, tokens }
    }

    /// Ordenado por id, no máximo 500 linhas.
    pub async fn list(&self, ctx: &RequestContext, only_active: bool) -> Result<Vec<Principal>, AppError> {
        ctx.bound(self.principals.list(PrincipalKind::Customer, only_active))
            .await
    }

    pub async fn get(&self, ctx: &RequestContext, id: i64) -> Result<Principal, AppError> {
        ctx.bound(self.principals.find_by_id(id))
            .await?
            .filter(|p| p.kind == PrincipalKind::Customer)
            .ok_or(AppError::CustomerNotFound(id))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        name: &str,
        phone: &str,
    ) -> Result<Principal, AppError> {
        ctx.bound(self.principals.update_profile(PrincipalKind::Customer, id, name, phone))
            .await?
            .ok_or(AppError::CustomerNotFound(id))
    }

    /// Bloqueia o cliente e derruba todas as sessões dele.
    pub async fn block(&self, ctx: &RequestContext, id: i64) -> Result<Principal, AppError> {
        let customer = ctx
            .bound(self.principals.set_active(PrincipalKind::Customer, id, false))
            .await?
            .ok_or(AppError::CustomerNotFound(id))?;
        let revoked = ctx.bound(self.tokens.delete_for_principal(id)).await?;

        tracing::info!(customer_id = id, revoked, "🚫 Cliente bloqueado");
        Ok(customer)
    }

    pub async fn unblock(&self, ctx: &RequestContext, id: i64) -> Result<Principal, AppError> {
        let customer = ctx
            .bound(self.principals.set_active(PrincipalKind::Customer, id, true))
            .await?
            .ok_or(AppError::CustomerNotFound(id))?;

        tracing::info!(customer_id = id, "Cliente desbloqueado");
        Ok(customer)
    }

    /// Remoção lógica: vendas antigas continuam apontando para o cliente.
    pub async fn remove(&self, ctx: &RequestContext, id: i64) -> Result<Principal, AppError> {
        let customer = self.block(ctx, id).await?;
        tracing::info!(customer_id = id, "🗑️ Cliente removido");
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, time::Duration};

    use chrono::Utc;

    use super::*;
    use crate::{db::MemoryStore, models::auth::NewPrincipal};

    fn ctx() -> RequestContext {
        RequestContext::with_timeout(Duration::from_secs(5))
    }

    async fn principal(store: &MemoryStore, kind: PrincipalKind, phone: &str) -> Principal {
        let new = NewPrincipal {
            kind,
            name: "Ana".into(),
            phone: phone.into(),
            password_hash: "x".into(),
            roles: BTreeSet::new(),
        };
        store.create(&new).await.unwrap()
    }

    fn service(store: &MemoryStore) -> CustomerService {
        CustomerService::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn block_revokes_sessions_and_hides_from_active_list() {
        let store = MemoryStore::new();
        let customers = service(&store);
        let ana = principal(&store, PrincipalKind::Customer, "+1").await;
        principal(&store, PrincipalKind::Customer, "+2").await;
        store.put_token(&"ab".repeat(32), ana.id, Utc::now(), None).await;

        let blocked = customers.block(&ctx(), ana.id).await.unwrap();

        assert!(!blocked.active);
        assert_eq!(store.token_count().await, 0);
        assert_eq!(customers.list(&ctx(), true).await.unwrap().len(), 1);
        assert_eq!(customers.list(&ctx(), false).await.unwrap().len(), 2);

        let back = customers.unblock(&ctx(), ana.id).await.unwrap();
        assert!(back.active);
    }

    #[tokio::test]
    async fn managers_are_not_customers() {
        let store = MemoryStore::new();
        let customers = service(&store);
        let manager = principal(&store, PrincipalKind::Manager, "+1").await;

        assert!(matches!(
            customers.get(&ctx(), manager.id).await,
            Err(AppError::CustomerNotFound(_))
        ));
        assert!(matches!(
            customers.block(&ctx(), manager.id).await,
            Err(AppError::CustomerNotFound(_))
        ));
        assert!(customers.list(&ctx(), false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_name_and_phone() {
        let store = MemoryStore::new();
        let customers = service(&store);
        let ana = principal(&store, PrincipalKind::Customer, "+1").await;

        let updated = customers.update(&ctx(), ana.id, "Ana Maria", "+9").await.unwrap();

        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.phone, "+9");
        assert!(matches!(
            customers.update(&ctx(), 42, "X", "+3").await,
            Err(AppError::CustomerNotFound(42))
        ));
    }
}
