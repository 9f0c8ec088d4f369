//! Position Tracking Bounded Context
//!
//! The position aggregate folds order fills into direction, quantities,
//! average prices, and PnL.

pub mod aggregate;
pub mod errors;
pub mod value_objects;

pub use aggregate::Position;
pub use errors::PositionError;
pub use value_objects::PositionSide;
