//! Position tracking errors.

use std::fmt;

/// Errors that can occur applying fills to a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// A fill with this execution ID was already applied.
    DuplicateExecutionId {
        /// The repeated execution ID.
        execution_id: String,
    },

    /// The position has returned to flat and closed.
    PositionClosed {
        /// The closed position's ID.
        position_id: String,
    },

    /// The fill references a different instrument.
    InstrumentMismatch {
        /// Instrument the position tracks.
        expected: String,
        /// Instrument on the fill.
        actual: String,
    },

    /// The opening fill carries no position ID.
    MissingPositionId {
        /// Client order ID of the fill.
        client_order_id: String,
    },

    /// The fill itself is malformed.
    InvalidFill {
        /// What was wrong.
        message: String,
    },
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateExecutionId { execution_id } => {
                write!(f, "Duplicate execution ID: {execution_id}")
            }
            Self::PositionClosed { position_id } => {
                write!(f, "Position {position_id} is closed")
            }
            Self::InstrumentMismatch { expected, actual } => {
                write!(
                    f,
                    "Fill instrument {actual} does not match position instrument {expected}"
                )
            }
            Self::MissingPositionId { client_order_id } => {
                write!(f, "Fill from order {client_order_id} carries no position ID")
            }
            Self::InvalidFill { message } => {
                write!(f, "Invalid fill: {message}")
            }
        }
    }
}

impl std::error::Error for PositionError {}
