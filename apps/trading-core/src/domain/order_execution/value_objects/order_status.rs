//! Order status in the lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order status in the shared lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order constructed locally, not yet routed.
    Initialized,
    /// Order denied before leaving the system.
    Denied,
    /// Order sent to the venue, awaiting acknowledgment.
    Submitted,
    /// Order working at the venue.
    Accepted,
    /// Order rejected by the venue.
    Rejected,
    /// Update request in flight, awaiting venue confirmation.
    PendingUpdate,
    /// Cancel request in flight, awaiting venue confirmation.
    PendingCancel,
    /// Stop order's trigger price has traded.
    Triggered,
    /// Order partially filled, remainder working.
    PartiallyFilled,
    /// Order completely filled.
    Filled,
    /// Order canceled.
    Canceled,
    /// Order expired (GTD past its expire time).
    Expired,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Denied | Self::Rejected | Self::Canceled | Self::Expired | Self::Filled
        )
    }

    /// Returns true if the order is working at the venue.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self,
            Self::Accepted
                | Self::PendingUpdate
                | Self::PendingCancel
                | Self::Triggered
                | Self::PartiallyFilled
        )
    }

    /// Returns true if the order can still receive fills.
    #[must_use]
    pub const fn can_fill(&self) -> bool {
        matches!(
            self,
            Self::Submitted
                | Self::Accepted
                | Self::PendingUpdate
                | Self::PendingCancel
                | Self::Triggered
                | Self::PartiallyFilled
        )
    }

    /// Returns true if a venue response is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::PendingUpdate | Self::PendingCancel)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::Denied => write!(f, "DENIED"),
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::PendingUpdate => write!(f, "PENDING_UPDATE"),
            Self::PendingCancel => write!(f, "PENDING_CANCEL"),
            Self::Triggered => write!(f, "TRIGGERED"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        for status in [
            OrderStatus::Denied,
            OrderStatus::Rejected,
            OrderStatus::Canceled,
            OrderStatus::Expired,
            OrderStatus::Filled,
        ] {
            assert!(status.is_terminal());
            assert!(!status.is_open());
        }
    }

    #[test]
    fn open_states() {
        assert!(OrderStatus::Accepted.is_open());
        assert!(OrderStatus::PartiallyFilled.is_open());
        assert!(OrderStatus::Triggered.is_open());
        assert!(!OrderStatus::Initialized.is_open());
        assert!(!OrderStatus::Submitted.is_open());
    }

    #[test]
    fn can_fill_states() {
        assert!(OrderStatus::Submitted.can_fill());
        assert!(OrderStatus::Accepted.can_fill());
        assert!(OrderStatus::PendingCancel.can_fill());
        assert!(!OrderStatus::Initialized.can_fill());
        assert!(!OrderStatus::Filled.can_fill());
    }

    #[test]
    fn pending_states() {
        assert!(OrderStatus::PendingUpdate.is_pending());
        assert!(OrderStatus::PendingCancel.is_pending());
        assert!(!OrderStatus::Accepted.is_pending());
    }

    #[test]
    fn status_display() {
        assert_eq!(
            format!("{}", OrderStatus::PartiallyFilled),
            "PARTIALLY_FILLED"
        );
        assert_eq!(format!("{}", OrderStatus::PendingCancel), "PENDING_CANCEL");
    }

    #[test]
    fn status_serde() {
        let json = serde_json::to_string(&OrderStatus::PendingUpdate).unwrap();
        assert_eq!(json, "\"PENDING_UPDATE\"");
        let parsed: OrderStatus = serde_json::from_str("\"TRIGGERED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Triggered);
    }
}
