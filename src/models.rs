pub mod auth;
pub mod catalog;
pub mod customers;
pub mod sales;
