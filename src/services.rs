pub mod auth;
pub mod catalog_service;
pub mod customer_service;
pub mod rbac_service;
pub mod sale_service;

pub use auth::{AuthService, AuthSettings};
pub use catalog_service::CatalogService;
pub use customer_service::CustomerService;
pub use rbac_service::RbacService;
pub use sale_service::SaleService;
