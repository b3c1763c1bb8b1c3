//! Marketplace persistence layer
//!
//! SQLite-backed storage for accounts, products, carts, orders and the
//! token blacklist, exposed through the [`Repository`] trait.

pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
pub use store::Repository;
