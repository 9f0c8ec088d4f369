//! Contingency relationships between orders in a list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an order relates to the other orders in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContingencyType {
    /// One cancels the other(s).
    Oco,
    /// One triggers the other(s).
    Oto,
    /// One updates the other(s).
    Ouo,
}

impl fmt::Display for ContingencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oco => write!(f, "OCO"),
            Self::Oto => write!(f, "OTO"),
            Self::Ouo => write!(f, "OUO"),
        }
    }
}
