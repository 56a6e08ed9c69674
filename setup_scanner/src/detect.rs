//! Setup detection over an annotated session.
//!
//! Both setups look only at the latest and second-latest bar, plus the
//! opening range and a short volume window:
//!
//! - **ORB Breakdown** fires when the latest close is strictly below the
//!   lowest low of the first `opening_range_bars` bars.
//! - **VWAP Reclaim** fires when the previous close was strictly below its
//!   VWAP, the latest close is strictly above its VWAP, no breakdown is in
//!   progress, and the latest volume exceeds `volume_multiplier` times the
//!   mean volume of the `confirmation_window` bars before it.
//!
//! A breakdown takes precedence, so at most one label is ever returned.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::{AnnotatedBar, AnnotatedSeries};

/// Fewer bars than this never produce a signal.
pub const MIN_BARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupLabel {
    VwapReclaim,
    OrbBreakdown,
}

impl fmt::Display for SetupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetupLabel::VwapReclaim => "VWAP Reclaim",
            SetupLabel::OrbBreakdown => "ORB Breakdown",
        })
    }
}

/// Labels triggered for one ticker. Ordered, so rendering is stable.
pub type SetupSet = BTreeSet<SetupLabel>;

/// The detector could not read a value it needs from the series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("bar {index}: {field} is not a finite number ({value})")]
    NonFinite {
        field: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{0} must be at least 1")]
    EmptyWindow(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub opening_range_bars: usize,
    pub confirmation_window: usize,
    pub volume_multiplier: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            opening_range_bars: 3,
            confirmation_window: 5,
            volume_multiplier: 1.2,
        }
    }
}

fn finite(field: &'static str, index: usize, value: f64) -> Result<f64, EvaluationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::NonFinite {
            field,
            index,
            value,
        })
    }
}

fn vwap_at(bars: &[AnnotatedBar], index: usize) -> Result<Option<f64>, EvaluationError> {
    bars[index]
        .vwap
        .map(|v| finite("vwap", index, v))
        .transpose()
}

/// Stateless evaluator; the same series always yields the same labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupDetector {
    params: DetectorParams,
}

impl SetupDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Lowest low of the opening bars, or `None` if the range isn't complete.
    pub fn opening_range_low(
        &self,
        bars: &[AnnotatedBar],
    ) -> Result<Option<f64>, EvaluationError> {
        let n = self.params.opening_range_bars;
        if n == 0 {
            return Err(EvaluationError::EmptyWindow("opening_range_bars"));
        }
        if bars.len() < n {
            return Ok(None);
        }
        bars[..n]
            .iter()
            .enumerate()
            .try_fold(f64::INFINITY, |low, (i, b)| {
                Ok::<_, EvaluationError>(low.min(finite("low", i, b.bar.low)?))
            })
            .map(Some)
    }

    /// True when the latest bar's volume beats the trailing mean by the
    /// configured multiple. Without a full window there is no confirmation.
    pub fn volume_confirmed(&self, bars: &[AnnotatedBar]) -> Result<bool, EvaluationError> {
        let window = self.params.confirmation_window;
        if window == 0 {
            return Err(EvaluationError::EmptyWindow("confirmation_window"));
        }
        let Some(latest_idx) = bars.len().checked_sub(1) else {
            return Ok(false);
        };
        if latest_idx < window {
            return Ok(false);
        }

        let latest = finite("volume", latest_idx, bars[latest_idx].bar.volume)?;
        let start = latest_idx - window;
        let total = bars[start..latest_idx]
            .iter()
            .enumerate()
            .try_fold(0.0, |sum, (i, b)| {
                Ok::<_, EvaluationError>(sum + finite("volume", start + i, b.bar.volume)?)
            })?;
        let mean = total / window as f64;

        Ok(latest > self.params.volume_multiplier * mean)
    }

    /// Evaluates both setups on the latest bar of `series`.
    pub fn detect(&self, series: &AnnotatedSeries) -> Result<SetupSet, EvaluationError> {
        let mut labels = SetupSet::new();
        let bars = series.bars();
        let n = bars.len();
        if n < MIN_BARS.max(self.params.opening_range_bars) {
            return Ok(labels);
        }

        let (prev_idx, latest_idx) = (n - 2, n - 1);
        let prev_close = finite("close", prev_idx, bars[prev_idx].bar.close)?;
        let latest_close = finite("close", latest_idx, bars[latest_idx].bar.close)?;
        let prev_vwap = vwap_at(bars, prev_idx)?;
        let latest_vwap = vwap_at(bars, latest_idx)?;
        let confirmed = self.volume_confirmed(bars)?;
        let Some(range_low) = self.opening_range_low(bars)? else {
            return Ok(labels);
        };

        if latest_close < range_low {
            labels.insert(SetupLabel::OrbBreakdown);
            return Ok(labels);
        }

        // A bar without VWAP (no volume yet this session) can't take part in a cross.
        let crossed = match (prev_vwap, latest_vwap) {
            (Some(pv), Some(lv)) => prev_close < pv && latest_close > lv,
            _ => false,
        };
        if crossed && confirmed {
            labels.insert(SetupLabel::VwapReclaim);
        }

        Ok(labels)
    }
}

/// [`SetupDetector::detect`] with the default parameters.
pub fn detect(series: &AnnotatedSeries) -> Result<SetupSet, EvaluationError> {
    SetupDetector::default().detect(series)
}
