use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vapers_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Image used when a product is created without one.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

/// Catalog product with its current stock level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    image: String,
    stock: u32,
    unit_price: Money,
    created_at: DateTime<Utc>,
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub stock: u32,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

impl Product {
    /// Validate a creation command and build the product.
    ///
    /// Name is trimmed and required, price must be positive, and a blank image
    /// falls back to [`PLACEHOLDER_IMAGE`].
    pub fn create(cmd: CreateProduct) -> DomainResult<Self> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if cmd.unit_price.is_zero() {
            return Err(DomainError::validation("unit_price must be positive"));
        }

        let image = cmd
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string();

        Ok(Self {
            id: cmd.product_id,
            name: name.to_string(),
            image,
            stock: cmd.stock,
            unit_price: cmd.unit_price,
            created_at: cmd.occurred_at,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }

    /// Add purchased units to the stock.
    pub fn restock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock overflow"))?;
        Ok(())
    }

    /// Remove sold units from the stock.
    pub fn withdraw(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if !self.has_stock_for(quantity) {
            return Err(DomainError::insufficient_stock(quantity, self.stock));
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Overwrite the stock level (manual correction).
    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Read-only id → name lookup over a product list.
///
/// Unknown ids resolve to their own string form, so a sale referencing a
/// product missing from the catalog still renders with a label.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog<'a> {
    names: HashMap<ProductId, &'a str>,
    stock_total: u64,
}

impl<'a> ProductCatalog<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        let names = products.iter().map(|p| (p.id, p.name())).collect();
        let stock_total = products.iter().map(|p| u64::from(p.stock)).sum();
        Self { names, stock_total }
    }

    /// Resolve a product id to its display name, falling back to the raw id.
    pub fn name_of(&self, id: &ProductId) -> Cow<'a, str> {
        match self.names.get(id) {
            Some(name) => Cow::Borrowed(*name),
            None => Cow::Owned(id.to_string()),
        }
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.names.contains_key(id)
    }

    /// Units left across the whole catalog.
    pub fn stock_total(&self) -> u64 {
        self.stock_total
    }
}
