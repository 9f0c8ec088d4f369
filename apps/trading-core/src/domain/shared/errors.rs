//! Domain errors for the trading core.

use std::fmt;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Arithmetic overflowed the backing representation.
    Overflow {
        /// Type involved (e.g., "Price").
        type_name: String,
        /// Operation that overflowed.
        operation: String,
    },

    /// Arithmetic between two different currencies.
    CurrencyMismatch {
        /// Left-hand currency code.
        lhs: String,
        /// Right-hand currency code.
        rhs: String,
    },

    /// Entity not found.
    NotFound {
        /// Entity type.
        entity_type: String,
        /// Entity identifier.
        id: String,
    },

    /// Aggregate invariant violated.
    InvariantViolation {
        /// Aggregate type.
        aggregate: String,
        /// Invariant that was violated.
        invariant: String,
        /// Current state description.
        state: String,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::Overflow {
                type_name,
                operation,
            } => {
                write!(f, "{type_name} overflow in {operation}")
            }
            Self::CurrencyMismatch { lhs, rhs } => {
                write!(f, "Currency mismatch: {lhs} vs {rhs}")
            }
            Self::NotFound { entity_type, id } => {
                write!(f, "{entity_type} not found: {id}")
            }
            Self::InvariantViolation {
                aggregate,
                invariant,
                state,
            } => {
                write!(
                    f,
                    "Invariant violation in {aggregate}: {invariant} (state: {state})"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
