// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register_customer,
        handlers::auth::customer_token,
        handlers::auth::validate_token,
        handlers::auth::manager_token,
        handlers::auth::register_manager,
        handlers::auth::logout,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::remove_customer,
        handlers::customers::block_customer,
        handlers::customers::unblock_customer,
        handlers::customers::my_purchases,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::save_product,
        handlers::products::remove_product,

        // --- Sales ---
        handlers::sales::record_sale,
        handlers::sales::list_my_sales,
        handlers::sales::sales_total,
        handlers::sales::get_sale,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::PrincipalKind,
            models::auth::Role,
            models::auth::Principal,
            models::auth::RegisterCustomerPayload,
            models::auth::RegisterManagerPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::TokenPayload,
            models::auth::TokenStatusResponse,

            // --- Customers ---
            models::customers::UpdateCustomerPayload,

            // --- Catalog ---
            models::catalog::Product,
            models::catalog::SaveProductPayload,

            // --- Sales ---
            models::sales::Sale,
            models::sales::SaleLine,
            models::sales::SaleLineRequest,
            models::sales::RecordSalePayload,
            models::sales::SalesTotal,
        )
    ),
    tags(
        (name = "Auth", description = "Registro, login e validação de tokens"),
        (name = "Customers", description = "Administração de clientes"),
        (name = "Products", description = "Catálogo e estoque"),
        (name = "Sales", description = "Registro e relatórios de vendas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_token",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
