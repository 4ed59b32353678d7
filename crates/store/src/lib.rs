//! Persistent store for categories, products, customers and sales.
//!
//! [`Store`] covers plain reads and catalog writes; sale creation goes through
//! a [`UnitOfWork`] obtained from [`Store::begin`], which commits explicitly
//! and rolls back when dropped.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnitOfWork, Tables};
pub use model::{
    Category, Customer, DEFAULT_IMAGE_URL, LineItemDetail, NewCategory, NewCustomer, NewLineItem, NewProduct,
    NewSale, Product, ProductView, Sale, SaleDetail, SaleLineItem,
};
pub use postgres::{PostgresStore, PostgresUnitOfWork};
pub use store::{Store, UnitOfWork};
