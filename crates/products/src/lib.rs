//! Catalog products and their stock levels.

pub mod product;

pub use product::{CreateProduct, PLACEHOLDER_IMAGE, Product, ProductCatalog};
