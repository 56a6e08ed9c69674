//! Bar series normalizer: cleaning plus the running session VWAP.
//!
//! Rows with a missing (non-finite) OHLCV value, a non-positive price or a
//! negative volume are dropped. The remainder is sorted by timestamp and
//! duplicate timestamps are collapsed to their first occurrence. Each kept
//! bar is then annotated with
//!
//! ```text
//! vwap[i] = Σ(volume[0..=i] · typical_price[0..=i]) / Σ(volume[0..=i])
//! ```
//!
//! While the cumulative volume is still zero there is no VWAP to report, and
//! the bar carries `None` instead of a made-up value.

use market_data_ingestor::models::{
    bar::{Bar, BarSeries},
    timeframe::TimeFrame,
};
use thiserror::Error;

/// Nothing usable survived cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{symbol}: no usable bars ({dropped} of {received} rows dropped)")]
pub struct UnusableSeries {
    pub symbol: String,
    pub received: usize,
    pub dropped: usize,
}

/// A bar plus the session VWAP as of its close.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedBar {
    pub bar: Bar,
    /// `None` while cumulative volume is zero.
    pub vwap: Option<f64>,
}

/// A clean, strictly time-ordered series annotated with cumulative VWAP.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    symbol: String,
    timeframe: TimeFrame,
    bars: Vec<AnnotatedBar>,
}

impl AnnotatedSeries {
    /// Wraps already-annotated bars as-is.
    ///
    /// No cleaning happens here; the detector still refuses to read
    /// non-finite values from a series built this way.
    pub fn from_parts(
        symbol: impl Into<String>,
        timeframe: TimeFrame,
        bars: Vec<AnnotatedBar>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    pub fn bars(&self) -> &[AnnotatedBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&AnnotatedBar> {
        self.bars.last()
    }
}

fn is_usable(bar: &Bar) -> bool {
    bar.is_complete()
        && bar.volume >= 0.0
        && [bar.open, bar.high, bar.low, bar.close]
            .iter()
            .all(|p| *p > 0.0)
}

/// Running VWAP over `bars` in the order given.
pub fn cumulative_vwap(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut pv = 0.0;
    let mut volume = 0.0;
    bars.iter()
        .map(|bar| {
            pv += bar.volume * bar.typical_price();
            volume += bar.volume;
            (volume > 0.0).then(|| pv / volume)
        })
        .collect()
}

/// Cleans `raw` and annotates it with cumulative VWAP.
pub fn normalize(raw: &BarSeries) -> Result<AnnotatedSeries, UnusableSeries> {
    let received = raw.bars.len();

    let mut bars: Vec<Bar> = raw.bars.iter().filter(|b| is_usable(b)).cloned().collect();
    // Stable sort keeps the first of any duplicated timestamps in front.
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);

    if bars.is_empty() {
        return Err(UnusableSeries {
            symbol: raw.symbol.clone(),
            received,
            dropped: received,
        });
    }

    let vwaps = cumulative_vwap(&bars);
    let bars = bars
        .into_iter()
        .zip(vwaps)
        .map(|(bar, vwap)| AnnotatedBar { bar, vwap })
        .collect();

    Ok(AnnotatedSeries::from_parts(
        raw.symbol.clone(),
        raw.timeframe,
        bars,
    ))
}
