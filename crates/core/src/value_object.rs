//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two instances
/// holding the same attributes are interchangeable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Currency amount in the smallest unit (cents).
///
/// All prices, totals and ledger amounts flow through this type so that
/// arithmetic stays exact; the 2-decimal rendering only happens at display
/// time.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `self * quantity`, or `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(quantity)).map(Money)
    }

    /// Line total for `quantity` units at this unit price.
    pub fn line_total(self, quantity: u32) -> DomainResult<Money> {
        self.checked_mul(quantity)
            .ok_or_else(|| DomainError::validation("line total overflows"))
    }

    /// Average amount per unit, rounded half-up to the nearest cent.
    ///
    /// Returns zero when `units` is zero.
    pub fn per_unit(self, units: u64) -> Money {
        if units == 0 {
            return Money::ZERO;
        }
        let num = u128::from(self.0) * 2 + u128::from(units);
        let den = u128::from(units) * 2;
        Money((num / den) as u64)
    }

    /// Sum of amounts, or `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(iter: I) -> Option<Money> {
        iter.into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<u64> for Money {
    fn from(cents: u64) -> Self {
        Self(cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_two_decimals() {
        assert_eq!(Money::from_cents(1250).to_string(), "12.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn per_unit_rounds_half_up_and_guards_zero() {
        assert_eq!(Money::from_cents(1000).per_unit(3), Money::from_cents(333));
        assert_eq!(Money::from_cents(1001).per_unit(2), Money::from_cents(501));
        assert_eq!(Money::from_cents(500).per_unit(0), Money::ZERO);
    }

    #[test]
    fn line_total_rejects_overflow() {
        let err = Money::from_cents(u64::MAX).line_total(2).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(Money::from_cents(250).line_total(4).unwrap(), Money::from_cents(1000));
    }
}
