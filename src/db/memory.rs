// src/db/memory.rs

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    common::error::AppError,
    db::{PrincipalStore, ProductStore, SaleStore, SaleTransaction, TokenStore},
    models::{
        auth::{NewPrincipal, Principal, PrincipalKind, TokenRecord},
        catalog::{Product, ProductDraft},
        sales::{LockedStock, Sale, SaleLine},
    },
};

#[derive(Debug, Clone)]
struct StoredToken {
    principal_id: i64,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    principals: BTreeMap<i64, Principal>,
    tokens: HashMap<String, StoredToken>,
    products: BTreeMap<i64, Product>,
    sales: BTreeMap<i64, Sale>,
    next_principal_id: i64,
    next_product_id: i64,
    next_sale_id: i64,
    next_line_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Implementação em memória de todos os repositórios, para testes e
/// desenvolvimento local sem Postgres.
///
/// Uma transação de venda segura o mutex do estado inteiro e trabalha numa
/// cópia; o `commit` troca a cópia pelo estado. Isso serializa todas as
/// vendas, o que é mais forte que o lock por linha do Postgres.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sale_count(&self) -> usize {
        self.state.lock().await.sales.len()
    }

    pub async fn token_count(&self) -> usize {
        self.state.lock().await.tokens.len()
    }

    /// Grava um token arbitrário (útil para simular tokens já expirados).
    pub async fn put_token(
        &self,
        token: &str,
        principal_id: i64,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.state.lock().await.tokens.insert(
            token.to_string(),
            StoredToken { principal_id, issued_at, expires_at },
        );
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn create(&self, new: &NewPrincipal) -> Result<Principal, AppError> {
        let mut state = self.state.lock().await;
        let taken = state
            .principals
            .values()
            .any(|p| p.kind == new.kind && p.phone == new.phone);
        if taken {
            return Err(AppError::PhoneAlreadyRegistered);
        }
        let id = next(&mut state.next_principal_id);
        let principal = Principal {
            id,
            kind: new.kind,
            name: new.name.clone(),
            phone: new.phone.clone(),
            password_hash: new.password_hash.clone(),
            roles: new.role_strings(),
            active: true,
            created_at: Utc::now(),
        };
        state.principals.insert(id, principal.clone());
        Ok(principal)
    }

    async fn find_by_phone(&self, kind: PrincipalKind, phone: &str) -> Result<Option<Principal>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .principals
            .values()
            .find(|p| p.kind == kind && p.phone == phone)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, AppError> {
        Ok(self.state.lock().await.principals.get(&id).cloned())
    }

    async fn list(&self, kind: PrincipalKind, only_active: bool) -> Result<Vec<Principal>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .principals
            .values()
            .filter(|p| p.kind == kind && (!only_active || p.active))
            .take(500)
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        kind: PrincipalKind,
        id: i64,
        name: &str,
        phone: &str,
    ) -> Result<Option<Principal>, AppError> {
        let mut state = self.state.lock().await;
        let conflict = state
            .principals
            .values()
            .any(|p| p.kind == kind && p.phone == phone && p.id != id);
        if conflict {
            return Err(AppError::PhoneAlreadyRegistered);
        }
        Ok(state
            .principals
            .get_mut(&id)
            .filter(|p| p.kind == kind)
            .map(|p| {
                p.name = name.to_string();
                p.phone = phone.to_string();
                p.clone()
            }))
    }

    async fn set_active(&self, kind: PrincipalKind, id: i64, active: bool) -> Result<Option<Principal>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state
            .principals
            .get_mut(&id)
            .filter(|p| p.kind == kind)
            .map(|p| {
                p.active = active;
                p.clone()
            }))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(
        &self,
        token: &str,
        principal_id: i64,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if !state.principals.contains_key(&principal_id) {
            return Err(AppError::InternalError(format!(
                "token para principal inexistente {principal_id}"
            )));
        }
        if state.tokens.contains_key(token) {
            return Err(AppError::InternalError("token duplicado".into()));
        }
        state
            .tokens
            .insert(token.to_string(), StoredToken { principal_id, issued_at, expires_at });
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<TokenRecord>, AppError> {
        let state = self.state.lock().await;
        // Tokens de principais bloqueados não valem, mesmo que ainda existam
        let record = state.tokens.get(token).and_then(|stored| {
            state
                .principals
                .get(&stored.principal_id)
                .filter(|owner| owner.active)
                .map(|owner| TokenRecord {
                    token: token.to_string(),
                    principal_id: stored.principal_id,
                    kind: owner.kind,
                    issued_at: stored.issued_at,
                    expires_at: stored.expires_at,
                })
        });
        Ok(record)
    }

    async fn delete(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.state.lock().await.tokens.remove(token).is_some())
    }

    async fn delete_for_principal(&self, principal_id: i64) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|_, stored| stored.principal_id != principal_id);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Product>, AppError> {
        let state = self.state.lock().await;
        Ok(state.products.values().filter(|p| p.active).take(500).cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, AppError> {
        let mut state = self.state.lock().await;
        let id = next(&mut state.next_product_id);
        let product = Product {
            id,
            name: draft.name.clone(),
            price: draft.price,
            qty: draft.qty,
            active: true,
            created_at: Utc::now(),
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> Result<Option<Product>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state.products.get_mut(&id).map(|p| {
            p.name = draft.name.clone();
            p.price = draft.price;
            p.qty = draft.qty;
            p.clone()
        }))
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Product>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state.products.get_mut(&id).map(|p| {
            p.active = active;
            p.clone()
        }))
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn SaleTransaction>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemorySaleTransaction { guard, staged }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Sale>, AppError> {
        Ok(self.state.lock().await.sales.get(&id).cloned())
    }

    async fn list_for_manager(&self, manager_id: i64) -> Result<Vec<Sale>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .sales
            .values()
            .rev()
            .filter(|s| s.manager_id == manager_id)
            .take(500)
            .cloned()
            .collect())
    }

    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Sale>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .sales
            .values()
            .rev()
            .filter(|s| s.customer_id == customer_id)
            .take(500)
            .cloned()
            .collect())
    }

    async fn total_for_manager(&self, manager_id: i64) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .sales
            .values()
            .filter(|s| s.manager_id == manager_id)
            .map(Sale::total)
            .fold(0i64, i64::saturating_add))
    }
}

pub struct MemorySaleTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl SaleTransaction for MemorySaleTransaction {
    async fn insert_sale(&mut self, manager_id: i64, customer_id: i64) -> Result<Sale, AppError> {
        let id = next(&mut self.staged.next_sale_id);
        let sale = Sale {
            id,
            manager_id,
            customer_id,
            created_at: Utc::now(),
            lines: Vec::new(),
        };
        self.staged.sales.insert(id, sale.clone());
        Ok(sale)
    }

    async fn lock_product(&mut self, product_id: i64) -> Result<Option<LockedStock>, AppError> {
        Ok(self.staged.products.get(&product_id).map(|p| LockedStock {
            id: p.id,
            price: p.price,
            qty: p.qty,
            active: p.active,
        }))
    }

    async fn decrement_stock(&mut self, product_id: i64, qty: i64) -> Result<(), AppError> {
        let product = self
            .staged
            .products
            .get_mut(&product_id)
            .ok_or(AppError::ProductNotFound(product_id))?;
        // Mesma garantia do CHECK (qty >= 0) da tabela
        if product.qty < qty {
            return Err(AppError::InternalError("products_qty_check violado".into()));
        }
        product.qty -= qty;
        Ok(())
    }

    async fn insert_line(
        &mut self,
        sale_id: i64,
        product_id: i64,
        qty: i64,
        unit_price: i64,
    ) -> Result<SaleLine, AppError> {
        let id = next(&mut self.staged.next_line_id);
        let line = SaleLine { id, sale_id, product_id, qty, unit_price };
        let sale = self
            .staged
            .sales
            .get_mut(&sale_id)
            .ok_or(AppError::SaleNotFound(sale_id))?;
        sale.lines.push(line.clone());
        Ok(line)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemorySaleTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn draft(qty: i64) -> ProductDraft {
        ProductDraft { name: "Arroz".into(), price: 500, qty }
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_state_untouched() {
        let store = MemoryStore::new();
        let product = ProductStore::insert(&store, &draft(10)).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            let sale = tx.insert_sale(1, 2).await.unwrap();
            tx.decrement_stock(product.id, 4).await.unwrap();
            tx.insert_line(sale.id, product.id, 4, 500).await.unwrap();
            // sem commit
        }

        let after = ProductStore::find_by_id(&store, product.id).await.unwrap().unwrap();
        assert_eq!(after.qty, 10);
        assert_eq!(store.sale_count().await, 0);
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = MemoryStore::new();
        let product = ProductStore::insert(&store, &draft(10)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let sale = tx.insert_sale(1, 2).await.unwrap();
        tx.decrement_stock(product.id, 4).await.unwrap();
        tx.insert_line(sale.id, product.id, 4, 500).await.unwrap();
        tx.commit().await.unwrap();

        let after = ProductStore::find_by_id(&store, product.id).await.unwrap().unwrap();
        assert_eq!(after.qty, 6);
        let stored = SaleStore::find_by_id(&store, sale.id).await.unwrap().unwrap();
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(store.total_for_manager(1).await.unwrap(), 2000);
    }

    #[tokio::test]
    async fn phone_is_unique_per_kind() {
        let store = MemoryStore::new();
        let new = |kind| NewPrincipal {
            kind,
            name: "Ana".into(),
            phone: "555".into(),
            password_hash: "x".into(),
            roles: BTreeSet::new(),
        };
        store.create(&new(PrincipalKind::Customer)).await.unwrap();
        store.create(&new(PrincipalKind::Manager)).await.unwrap();
        let dup = store.create(&new(PrincipalKind::Customer)).await;
        assert!(matches!(dup, Err(AppError::PhoneAlreadyRegistered)));
    }
}
