// src/services/catalog_service.rs

use std::sync::Arc;

use crate::{
    common::{context::RequestContext, error::AppError},
    db::ProductStore,
    models::catalog::{Product, ProductDraft},
};

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    pub async fn list_active(&self, ctx: &RequestContext) -> Result<Vec<Product>, AppError> {
        ctx.bound(self.products.list_active()).await
    }

    /// Sem `id` cria um produto novo; com `id` sobrescreve nome, preço e estoque.
    pub async fn save(
        &self,
        ctx: &RequestContext,
        id: Option<i64>,
        draft: &ProductDraft,
    ) -> Result<Product, AppError> {
        let product = match id {
            None => ctx.bound(self.products.insert(draft)).await?,
            Some(id) => ctx
                .bound(self.products.update(id, draft))
                .await?
                .ok_or(AppError::ProductNotFound(id))?,
        };

        tracing::info!(product_id = product.id, qty = product.qty, "📦 Produto salvo");
        Ok(product)
    }

    /// Remoção lógica, para não quebrar as posições de vendas antigas.
    pub async fn remove(&self, ctx: &RequestContext, id: i64) -> Result<Product, AppError> {
        let product = ctx
            .bound(self.products.set_active(id, false))
            .await?
            .ok_or(AppError::ProductNotFound(id))?;

        tracing::info!(product_id = id, "Produto removido do catálogo");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::MemoryStore;

    fn ctx() -> RequestContext {
        RequestContext::with_timeout(Duration::from_secs(5))
    }

    fn draft(name: &str, price: i64, qty: i64) -> ProductDraft {
        ProductDraft { name: name.into(), price, qty }
    }

    #[tokio::test]
    async fn save_creates_then_updates() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));

        let created = catalog.save(&ctx(), None, &draft("Café", 1290, 10)).await.unwrap();
        let updated = catalog
            .save(&ctx(), Some(created.id), &draft("Café 1kg", 2390, 5))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.price, 2390);
        assert_eq!(updated.qty, 5);
    }

    #[tokio::test]
    async fn updating_unknown_product_fails() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let result = catalog.save(&ctx(), Some(77), &draft("X", 1, 1)).await;
        assert!(matches!(result, Err(AppError::ProductNotFound(77))));
    }

    #[tokio::test]
    async fn removed_products_leave_the_active_list() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let kept = catalog.save(&ctx(), None, &draft("Arroz", 500, 3)).await.unwrap();
        let gone = catalog.save(&ctx(), None, &draft("Feijão", 700, 3)).await.unwrap();

        catalog.remove(&ctx(), gone.id).await.unwrap();

        let active = catalog.list_active(&ctx()).await.unwrap();
        assert_eq!(active, vec![kept]);
        assert!(matches!(catalog.remove(&ctx(), 999).await, Err(AppError::ProductNotFound(999))));
    }
}
