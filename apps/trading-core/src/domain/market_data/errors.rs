//! Market data errors.

use thiserror::Error;

use crate::domain::shared::DomainError;

/// Order book errors.
#[derive(Debug, Error)]
pub enum BookError {
    /// The operation is not supported at this book fidelity.
    #[error("operation '{operation}' unsupported for {book_type} books")]
    Unsupported {
        /// Book fidelity.
        book_type: String,
        /// Attempted operation.
        operation: String,
    },

    /// Book integrity violated (crossed book or level sum mismatch).
    #[error("book integrity violated: {message}")]
    Integrity {
        /// What was violated.
        message: String,
    },

    /// No resting order with this ID.
    #[error("order {order_id} not found in book")]
    OrderNotFound {
        /// Book order ID.
        order_id: u64,
    },

    /// Input references a different instrument.
    #[error("instrument {actual} does not match book instrument {expected}")]
    InstrumentMismatch {
        /// Instrument the book tracks.
        expected: String,
        /// Instrument on the input.
        actual: String,
    },
}

/// Bar aggregation errors.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// Aggregation step must be positive.
    #[error("aggregation step must be positive, was {step}")]
    InvalidStep {
        /// The offending step.
        step: usize,
    },

    /// The aggregation kind has no time interval.
    #[error("aggregation {aggregation} is not time-driven")]
    NotTimeDriven {
        /// The offending aggregation kind.
        aggregation: String,
    },

    /// The builder holds no data to build a bar from.
    #[error("bar builder for {bar_type} has no data")]
    NoData {
        /// Bar type being built.
        bar_type: String,
    },

    /// A value-level error from the shared primitives.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A clock or timer error.
    #[error(transparent)]
    Clock(#[from] crate::clock::ClockError),
}
