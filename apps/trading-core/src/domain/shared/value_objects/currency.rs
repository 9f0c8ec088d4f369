//! Currency codes for monetary amounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// An ISO 4217 fiat currency or a major crypto asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Currency {
    /// United States dollar.
    USD,
    /// Euro.
    EUR,
    /// Pound sterling.
    GBP,
    /// Japanese yen.
    JPY,
    /// Australian dollar.
    AUD,
    /// Tether.
    USDT,
    /// Bitcoin.
    BTC,
    /// Ether.
    ETH,
}

impl Currency {
    /// The currency code string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::JPY => "JPY",
            Self::AUD => "AUD",
            Self::USDT => "USDT",
            Self::BTC => "BTC",
            Self::ETH => "ETH",
        }
    }

    /// Display precision in decimal places.
    #[must_use]
    pub const fn precision(&self) -> u8 {
        match self {
            Self::JPY => 0,
            Self::USD | Self::EUR | Self::GBP | Self::AUD => 2,
            Self::USDT | Self::BTC | Self::ETH => 8,
        }
    }

    /// Returns true for crypto assets.
    #[must_use]
    pub const fn is_crypto(&self) -> bool {
        matches!(self, Self::USDT | Self::BTC | Self::ETH)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "JPY" => Ok(Self::JPY),
            "AUD" => Ok(Self::AUD),
            "USDT" => Ok(Self::USDT),
            "BTC" => Ok(Self::BTC),
            "ETH" => Ok(Self::ETH),
            other => Err(DomainError::InvalidValue {
                field: "currency".to_string(),
                message: format!("unknown currency code '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_round_trip() {
        for currency in [
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::JPY,
            Currency::AUD,
            Currency::USDT,
            Currency::BTC,
            Currency::ETH,
        ] {
            let parsed: Currency = currency.code().parse().unwrap();
            assert_eq!(parsed, currency);
        }
    }

    #[test]
    fn currency_parse_is_case_insensitive() {
        let parsed: Currency = "usd".parse().unwrap();
        assert_eq!(parsed, Currency::USD);
    }

    #[test]
    fn currency_parse_unknown_is_error() {
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn currency_precision() {
        assert_eq!(Currency::JPY.precision(), 0);
        assert_eq!(Currency::USD.precision(), 2);
        assert_eq!(Currency::BTC.precision(), 8);
    }

    #[test]
    fn currency_is_crypto() {
        assert!(Currency::BTC.is_crypto());
        assert!(!Currency::USD.is_crypto());
    }

    #[test]
    fn currency_serde() {
        let json = serde_json::to_string(&Currency::USDT).unwrap();
        assert_eq!(json, "\"USDT\"");
        let parsed: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Currency::USDT);
    }
}
