//! Bars and bar type naming.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::tick::PriceType;
use crate::domain::market_data::errors::AggregationError;
use crate::domain::shared::{
    DomainError, InstrumentId, Price, Quantity, UnixNanos, NANOS_PER_DAY, NANOS_PER_HOUR,
    NANOS_PER_MIN, NANOS_PER_SEC,
};

/// How a bar series is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarAggregation {
    /// Close every N ticks.
    Tick,
    /// Close every N units of traded volume.
    Volume,
    /// Close every N units of traded value (price times size).
    Value,
    /// Close every N seconds.
    Second,
    /// Close every N minutes.
    Minute,
    /// Close every N hours.
    Hour,
    /// Close every N days.
    Day,
}

impl BarAggregation {
    /// Returns true for wall-time driven aggregations.
    #[must_use]
    pub const fn is_time_driven(&self) -> bool {
        matches!(self, Self::Second | Self::Minute | Self::Hour | Self::Day)
    }

    /// The timer interval for `step` units of a time-driven aggregation.
    ///
    /// # Errors
    ///
    /// Returns error for non-time aggregations or a zero step.
    pub fn interval_ns(&self, step: usize) -> Result<u64, AggregationError> {
        if step == 0 {
            return Err(AggregationError::InvalidStep { step });
        }
        let step = step as u64;
        match self {
            Self::Second => Ok(NANOS_PER_SEC * step),
            Self::Minute => Ok(NANOS_PER_MIN * step),
            Self::Hour => Ok(NANOS_PER_HOUR * step),
            Self::Day => Ok(NANOS_PER_DAY * step),
            Self::Tick | Self::Volume | Self::Value => Err(AggregationError::NotTimeDriven {
                aggregation: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for BarAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => write!(f, "TICK"),
            Self::Volume => write!(f, "VOLUME"),
            Self::Value => write!(f, "VALUE"),
            Self::Second => write!(f, "SECOND"),
            Self::Minute => write!(f, "MINUTE"),
            Self::Hour => write!(f, "HOUR"),
            Self::Day => write!(f, "DAY"),
        }
    }
}

impl FromStr for BarAggregation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TICK" => Ok(Self::Tick),
            "VOLUME" => Ok(Self::Volume),
            "VALUE" => Ok(Self::Value),
            "SECOND" => Ok(Self::Second),
            "MINUTE" => Ok(Self::Minute),
            "HOUR" => Ok(Self::Hour),
            "DAY" => Ok(Self::Day),
            other => Err(DomainError::InvalidValue {
                field: "aggregation".to_string(),
                message: format!("unknown aggregation '{other}'"),
            }),
        }
    }
}

/// Whether bars are aggregated locally or received from a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationSource {
    /// Aggregated by this engine.
    Internal,
    /// Aggregated externally and received as data.
    External,
}

impl fmt::Display for AggregationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "INTERNAL"),
            Self::External => write!(f, "EXTERNAL"),
        }
    }
}

impl FromStr for AggregationSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INTERNAL" => Ok(Self::Internal),
            "EXTERNAL" => Ok(Self::External),
            other => Err(DomainError::InvalidValue {
                field: "aggregation_source".to_string(),
                message: format!("unknown aggregation source '{other}'"),
            }),
        }
    }
}

/// Step, aggregation kind, and price type of a bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarSpecification {
    /// Number of units per bar.
    pub step: usize,
    /// Aggregation kind.
    pub aggregation: BarAggregation,
    /// Which market price the series tracks.
    pub price_type: PriceType,
}

impl fmt::Display for BarSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.step, self.aggregation, self.price_type)
    }
}

/// Fully-qualified name of a bar series.
///
/// String form is
/// `{instrument_id}-{step}-{aggregation}-{price_type}-{INTERNAL|EXTERNAL}`;
/// the instrument id may itself contain dashes, so parsing consumes the four
/// trailing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarType {
    /// Instrument the series tracks.
    pub instrument_id: InstrumentId,
    /// Step, aggregation, and price type.
    pub spec: BarSpecification,
    /// Where the aggregation happens.
    pub aggregation_source: AggregationSource,
}

impl BarType {
    /// Create a bar type.
    #[must_use]
    pub const fn new(
        instrument_id: InstrumentId,
        spec: BarSpecification,
        aggregation_source: AggregationSource,
    ) -> Self {
        Self {
            instrument_id,
            spec,
            aggregation_source,
        }
    }
}

impl fmt::Display for BarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.instrument_id, self.spec, self.aggregation_source
        )
    }
}

impl FromStr for BarType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('-').collect();
        if tokens.len() < 5 {
            return Err(DomainError::InvalidValue {
                field: "bar_type".to_string(),
                message: format!(
                    "'{s}' is not in INSTRUMENT-STEP-AGGREGATION-PRICETYPE-SOURCE form"
                ),
            });
        }
        let source_token = tokens[tokens.len() - 1];
        let price_token = tokens[tokens.len() - 2];
        let aggregation_token = tokens[tokens.len() - 3];
        let step_token = tokens[tokens.len() - 4];
        let instrument_part = tokens[..tokens.len() - 4].join("-");

        let step: usize = step_token.parse().map_err(|_| DomainError::InvalidValue {
            field: "bar_type".to_string(),
            message: format!("'{step_token}' is not a valid step"),
        })?;
        Ok(Self {
            instrument_id: instrument_part.parse()?,
            spec: BarSpecification {
                step,
                aggregation: aggregation_token.parse()?,
                price_type: price_token.parse()?,
            },
            aggregation_source: source_token.parse()?,
        })
    }
}

impl Serialize for BarType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BarType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An OHLCV bar, immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// The series this bar belongs to.
    pub bar_type: BarType,
    /// Opening price.
    pub open: Price,
    /// Highest price.
    pub high: Price,
    /// Lowest price.
    pub low: Price,
    /// Closing price.
    pub close: Price,
    /// Traded volume.
    pub volume: Quantity,
    /// Close time of the bar interval.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

impl Bar {
    /// Create a bar, validating the OHLC shape.
    ///
    /// # Errors
    ///
    /// Returns error unless `low <= open <= high` and `low <= close <= high`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bar_type: BarType,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Result<Self, DomainError> {
        if low > open || low > close || high < open || high < close {
            return Err(DomainError::InvalidValue {
                field: "bar".to_string(),
                message: format!(
                    "OHLC out of shape: open={open} high={high} low={low} close={close}"
                ),
            });
        }
        Ok(Self {
            bar_type,
            open,
            high,
            low,
            close,
            volume,
            ts_event,
            ts_init,
        })
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.bar_type, self.open, self.high, self.low, self.close, self.volume, self.ts_event
        )
    }
}
