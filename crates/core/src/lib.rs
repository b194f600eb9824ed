//! Shared primitives for the vapers domain crates: ids, money and errors.
//!
//! Nothing here touches IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{FinanceEntryId, ProductId, PurchaseId, SaleId};
pub use value_object::{Money, ValueObject};
