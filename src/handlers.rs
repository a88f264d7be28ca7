pub mod auth;
pub mod customers;
pub mod products;
pub mod sales;
