//! Errors raised by catalog, stock, sales and ledger rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure of a business rule.
///
/// Variants carry a human-readable detail; the HTTP layer maps each one to a
/// status code and a stable error code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input: blank name, zero quantity, non-positive price...
    #[error("invalid input: {0}")]
    Validation(String),

    /// Stored state that breaks a rule, or arithmetic that would overflow.
    #[error("inconsistent state: {0}")]
    InvariantViolation(String),

    #[error("malformed id: {0}")]
    InvalidId(String),

    #[error("record not found")]
    NotFound,

    /// A record with the same id already exists.
    #[error("duplicate record: {0}")]
    Conflict(String),

    #[error("only {available} unit(s) in stock, {requested} requested")]
    InsufficientStock { requested: u32, available: u32 },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn insufficient_stock(requested: u32, available: u32) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_shortfall_message_names_both_counts() {
        let err = DomainError::insufficient_stock(5, 2);
        assert_eq!(err.to_string(), "only 2 unit(s) in stock, 5 requested");
    }

    #[test]
    fn detail_is_carried_into_the_message() {
        assert_eq!(
            DomainError::validation("cantidad must be positive").to_string(),
            "invalid input: cantidad must be positive"
        );
    }
}
