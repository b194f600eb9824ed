use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vapers_core::{DomainError, DomainResult, Entity, Money, ProductId, PurchaseId};

/// A restock purchase of one product.
///
/// `total` is always computed from `quantity * unit_price` at record time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    id: PurchaseId,
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
    total: Money,
    purchased_at: DateTime<Utc>,
}

/// Command: RecordPurchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPurchase {
    pub purchase_id: PurchaseId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

impl Purchase {
    pub fn record(cmd: RecordPurchase) -> DomainResult<Self> {
        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        if cmd.unit_price.is_zero() {
            return Err(DomainError::validation("unit_price must be positive"));
        }

        let total = cmd.unit_price.line_total(cmd.quantity)?;

        Ok(Self {
            id: cmd.purchase_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            unit_price: cmd.unit_price,
            total,
            purchased_at: cmd.occurred_at,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
