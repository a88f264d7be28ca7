pub mod principal_repo;
pub use principal_repo::{PrincipalRepository, PrincipalStore};
pub mod token_repo;
pub use token_repo::{TokenRepository, TokenStore};
pub mod product_repo;
pub use product_repo::{ProductRepository, ProductStore};
pub mod sale_repo;
pub use sale_repo::{SaleRepository, SaleStore, SaleTransaction};
pub mod memory;
pub use memory::MemoryStore;
