//! Position side.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a position, derived from the sign of its net quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// No exposure.
    Flat,
    /// Net bought.
    Long,
    /// Net sold.
    Short,
}

impl PositionSide {
    /// Map a signed net quantity to its side.
    #[must_use]
    pub fn from_net_qty(net_qty: Decimal) -> Self {
        if net_qty > Decimal::ZERO {
            Self::Long
        } else if net_qty < Decimal::ZERO {
            Self::Short
        } else {
            Self::Flat
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "FLAT"),
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_from_net_qty_sign() {
        assert_eq!(PositionSide::from_net_qty(Decimal::new(5, 0)), PositionSide::Long);
        assert_eq!(
            PositionSide::from_net_qty(Decimal::new(-3, 0)),
            PositionSide::Short
        );
        assert_eq!(PositionSide::from_net_qty(Decimal::ZERO), PositionSide::Flat);
    }

    #[test]
    fn side_display() {
        assert_eq!(format!("{}", PositionSide::Long), "LONG");
        assert_eq!(format!("{}", PositionSide::Short), "SHORT");
        assert_eq!(format!("{}", PositionSide::Flat), "FLAT");
    }
}
