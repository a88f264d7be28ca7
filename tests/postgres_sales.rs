//! Testes contra um Postgres real. Rodar com:
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use rand::Rng;
use sqlx::PgPool;

use retail_backend::{
    common::{context::RequestContext, error::AppError},
    db::{PrincipalRepository, PrincipalStore, ProductRepository, ProductStore, SaleRepository},
    models::{
        auth::{NewPrincipal, PrincipalKind},
        catalog::ProductDraft,
        sales::SaleLineRequest,
    },
    services::SaleService,
};

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL deve ser definida");
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

fn ctx() -> RequestContext {
    RequestContext::with_timeout(Duration::from_secs(10))
}

async fn principal(repo: &PrincipalRepository, kind: PrincipalKind) -> i64 {
    let phone = format!("+55{}", rand::thread_rng().gen_range(1_000_000_000u64..9_999_999_999));
    let new = NewPrincipal {
        kind,
        name: "Teste".into(),
        phone,
        password_hash: "x".into(),
        roles: BTreeSet::new(),
    };
    repo.create(&new).await.unwrap().id
}

#[tokio::test]
#[ignore]
async fn failed_line_rolls_back_the_whole_sale() {
    let pool = pool().await;
    let principals = PrincipalRepository::new(pool.clone());
    let products = ProductRepository::new(pool.clone());
    let sales = SaleService::new(Arc::new(SaleRepository::new(pool.clone())), Arc::new(principals.clone()));

    let manager = principal(&principals, PrincipalKind::Manager).await;
    let customer = principal(&principals, PrincipalKind::Customer).await;
    let a = products.insert(&ProductDraft { name: "A".into(), price: 100, qty: 10 }).await.unwrap();
    let b = products.insert(&ProductDraft { name: "B".into(), price: 50, qty: 1 }).await.unwrap();

    let result = sales
        .record_sale(
            &ctx(),
            manager,
            customer,
            &[SaleLineRequest { product_id: a.id, qty: 4 }, SaleLineRequest { product_id: b.id, qty: 2 }],
        )
        .await;

    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));
    assert_eq!(products.find_by_id(a.id).await.unwrap().unwrap().qty, 10);
    assert_eq!(sales.list_for_manager(&ctx(), manager).await.unwrap().len(), 0);
}

#[tokio::test]
#[ignore]
async fn concurrent_sales_serialize_on_the_product_row() {
    let pool = pool().await;
    let principals = PrincipalRepository::new(pool.clone());
    let products = ProductRepository::new(pool.clone());
    let sales = SaleService::new(Arc::new(SaleRepository::new(pool.clone())), Arc::new(principals.clone()));

    let manager = principal(&principals, PrincipalKind::Manager).await;
    let customer = principal(&principals, PrincipalKind::Customer).await;
    let product = products.insert(&ProductDraft { name: "C".into(), price: 10, qty: 5 }).await.unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let sales = sales.clone();
            let line = SaleLineRequest { product_id: product.id, qty: 5 };
            tokio::spawn(async move { sales.record_sale(&ctx(), manager, customer, &[line]).await })
        })
        .collect();

    let mut ok = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AppError::InsufficientStock { available: 0, .. }) => short += 1,
            Err(e) => panic!("erro inesperado: {:?}", e),
        }
    }

    assert_eq!((ok, short), (1, 1));
    assert_eq!(products.find_by_id(product.id).await.unwrap().unwrap().qty, 0);
}
