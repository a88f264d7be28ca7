// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, customer_guard, manager_guard},
};

/// Monta o router completo da API.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas: registro, login e validação de token
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/customers", post(handlers::auth::register_customer))
        .route("/api/customers/token", post(handlers::auth::customer_token))
        .route("/api/customers/token/validate", post(handlers::auth::validate_token))
        .route("/api/managers/token", post(handlers::auth::manager_token));

    // Qualquer principal autenticado
    let principal_routes = Router::new()
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/auth/token", delete(handlers::auth::logout))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route("/api/customers/purchases", get(handlers::customers::my_purchases))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            customer_guard,
        ));

    // Gerentes; as rotas administrativas pedem ADMIN no próprio handler
    let manager_routes = Router::new()
        .route("/api/managers", post(handlers::auth::register_manager))
        .route("/api/managers/customers", get(handlers::customers::list_customers))
        .route(
            "/api/managers/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::remove_customer),
        )
        .route(
            "/api/managers/customers/{id}/block",
            post(handlers::customers::block_customer)
                .delete(handlers::customers::unblock_customer),
        )
        .route("/api/managers/products", post(handlers::products::save_product))
        .route("/api/managers/products/{id}", delete(handlers::products::remove_product))
        .route(
            "/api/managers/sales",
            post(handlers::sales::record_sale)
                .get(handlers::sales::list_my_sales),
        )
        .route("/api/managers/sales/total", get(handlers::sales::sales_total))
        .route("/api/managers/sales/{id}", get(handlers::sales::get_sale))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            manager_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(principal_routes)
        .merge(customer_routes)
        .merge(manager_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
