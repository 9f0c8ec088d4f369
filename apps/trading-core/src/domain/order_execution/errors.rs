//! Order execution errors.

use std::fmt;

use super::value_objects::OrderStatus;
use crate::domain::shared::UnixNanos;

/// Errors that can occur applying events to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The event is not a legal transition from the current status.
    InvalidStateTransition {
        /// Current order status.
        from: OrderStatus,
        /// Event type that was applied.
        event: String,
    },

    /// A fill with this execution ID was already applied.
    DuplicateExecutionId {
        /// The repeated execution ID.
        execution_id: String,
    },

    /// A fill would push the filled quantity past the order quantity.
    FillExceedsQuantity {
        /// Quantity of the offending fill.
        last_qty: String,
        /// Quantity still open.
        leaves_qty: String,
    },

    /// An update would drop the order quantity below the filled quantity.
    QuantityBelowFilled {
        /// Requested new quantity.
        requested: String,
        /// Quantity already filled.
        filled: String,
    },

    /// Event timestamps must be non-decreasing per order.
    StaleTimestamp {
        /// Timestamp of the offending event.
        ts_event: UnixNanos,
        /// Timestamp of the last applied event.
        ts_last: UnixNanos,
    },

    /// Expiration is only legal for GTD orders past their expire time.
    CannotExpire {
        /// Why the order cannot expire.
        reason: String,
    },

    /// Invalid order parameters.
    InvalidParameters {
        /// Field with the invalid value.
        field: String,
        /// Error message.
        message: String,
    },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition { from, event } => {
                write!(f, "Invalid order state transition: {event} while {from}")
            }
            Self::DuplicateExecutionId { execution_id } => {
                write!(f, "Duplicate execution ID: {execution_id}")
            }
            Self::FillExceedsQuantity {
                last_qty,
                leaves_qty,
            } => {
                write!(
                    f,
                    "Fill quantity {last_qty} exceeds open quantity {leaves_qty}"
                )
            }
            Self::QuantityBelowFilled { requested, filled } => {
                write!(
                    f,
                    "Updated quantity {requested} is below filled quantity {filled}"
                )
            }
            Self::StaleTimestamp { ts_event, ts_last } => {
                write!(
                    f,
                    "Event timestamp {ts_event} precedes last event timestamp {ts_last}"
                )
            }
            Self::CannotExpire { reason } => {
                write!(f, "Cannot expire order: {reason}")
            }
            Self::InvalidParameters { field, message } => {
                write!(f, "Invalid order parameter '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for OrderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_transition_display() {
        let err = OrderError::InvalidStateTransition {
            from: OrderStatus::Filled,
            event: "ORDER_CANCELED".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("ORDER_CANCELED"));
        assert!(msg.contains("FILLED"));
    }

    #[test]
    fn duplicate_execution_id_display() {
        let err = OrderError::DuplicateExecutionId {
            execution_id: "E-1".to_string(),
        };
        assert!(format!("{err}").contains("E-1"));
    }

    #[test]
    fn fill_exceeds_quantity_display() {
        let err = OrderError::FillExceedsQuantity {
            last_qty: "150".to_string(),
            leaves_qty: "100".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("150"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn stale_timestamp_display() {
        let err = OrderError::StaleTimestamp {
            ts_event: UnixNanos::new(5),
            ts_last: UnixNanos::new(10),
        };
        assert!(format!("{err}").contains("precedes"));
    }

    #[test]
    fn order_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(OrderError::CannotExpire {
            reason: "not GTD".to_string(),
        });
        assert!(!err.to_string().is_empty());
    }
}
