use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vapers_core::{DomainError, DomainResult, Entity, Money, ProductId, SaleId};

/// Customer label stored when a sale is recorded without one.
pub const WALK_IN_CUSTOMER: &str = "Anónimo";

/// A recorded sale of one product to one customer.
///
/// Records are immutable once stored. Fields are public so hosts can
/// rehydrate them from storage; [`SaleRecord::record`] is the validated way
/// to create new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
    pub customer: String,
    pub sold_at: DateTime<Utc>,
}

/// Command: RecordSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSale {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub customer: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl SaleRecord {
    /// Validate a sale command and build the record.
    ///
    /// The total is computed here and never taken from the caller.
    pub fn record(cmd: RecordSale) -> DomainResult<Self> {
        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let total = cmd.unit_price.line_total(cmd.quantity)?;

        let customer = cmd
            .customer
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(WALK_IN_CUSTOMER)
            .to_string();

        Ok(Self {
            id: cmd.sale_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            unit_price: cmd.unit_price,
            total,
            customer,
            sold_at: cmd.occurred_at,
        })
    }

    /// Check that the stored total still equals `quantity * unit_price`.
    pub fn validate(&self) -> DomainResult<()> {
        match self.unit_price.checked_mul(self.quantity) {
            Some(expected) if expected == self.total => Ok(()),
            _ => Err(DomainError::validation(format!(
                "sale {}: total {} does not match {} x {}",
                self.id, self.total, self.quantity, self.unit_price
            ))),
        }
    }
}

impl Entity for SaleRecord {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
