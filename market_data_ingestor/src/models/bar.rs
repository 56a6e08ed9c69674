//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is used as the standard output for all [`DataProvider`](crate::providers::DataProvider)
//! implementations, regardless of asset class (stocks, futures, crypto, etc.).
//!
//! Price and volume fields a vendor did not supply are carried as `NaN`, the
//! same way a missing cell shows up in a tabular data set. Consumers that need
//! complete rows check [`Bar::is_complete`] before using a bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

/// A single time-series bar (OHLCV) for a given timestamp.
///
/// This struct is vendor-agnostic and is used throughout the data ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The start of the bar interval (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,

    /// Trade count for the bar. Not all providers supply this.
    pub trade_count: Option<u64>,

    /// Volume-weighted average price of this single bar, as reported by the vendor.
    /// Not all providers supply this.
    pub vwap: Option<f64>,
}

impl Bar {
    /// Builds a bar from the five OHLCV values, with no vendor extras.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            trade_count: None,
            vwap: None,
        }
    }

    /// `(high + low + close) / 3`.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// True when every OHLCV field holds a finite value.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`TimeFrame`], making the data set self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL", "ESU24").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: TimeFrame, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap()
    }

    #[test]
    fn typical_price_is_mean_of_high_low_close() {
        let bar = Bar::new(ts(), 10.0, 12.0, 9.0, 11.0, 100.0);
        assert!((bar.typical_price() - 32.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn nan_field_makes_bar_incomplete() {
        let mut bar = Bar::new(ts(), 10.0, 12.0, 9.0, 11.0, 100.0);
        assert!(bar.is_complete());

        bar.volume = f64::NAN;
        assert!(!bar.is_complete());

        bar.volume = 100.0;
        bar.low = f64::INFINITY;
        assert!(!bar.is_complete());
    }

    #[test]
    fn vendor_extras_do_not_affect_completeness() {
        let bar = Bar {
            trade_count: None,
            vwap: Some(f64::NAN),
            ..Bar::new(ts(), 1.0, 1.0, 1.0, 1.0, 0.0)
        };
        assert!(bar.is_complete());
    }
}
