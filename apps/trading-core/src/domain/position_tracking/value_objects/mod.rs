//! Position Tracking Value Objects

mod position_side;

pub use position_side::PositionSide;
