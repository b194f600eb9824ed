//! Restock purchases.

pub mod purchase;

pub use purchase::{Purchase, RecordPurchase};
