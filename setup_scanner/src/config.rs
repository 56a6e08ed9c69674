//! Scanner configuration: defaults, TOML loading, normalization and validation.
//!
//! Every key is optional. An empty file (or no file at all) reproduces the
//! stock scanner: the 28-ticker watch list, 5-minute bars, one session of
//! history, a 1.2x volume confirmation over the 5 prior bars, and a 3-bar
//! opening range in New York regular trading hours.
//!
//! ```toml
//! tickers = ["NVDA", "TSLA", "AMD"]
//! interval = "5Min"
//! lookback = "1D"
//! volume_multiplier = 1.2
//! confirmation_window = 5
//! opening_range_bars = 3
//!
//! [session]
//! timezone = "America/New_York"
//! regular_hours_only = true
//!
//! [alpaca]
//! feed = "iex"
//! ```
//!
//! Entrypoints:
//! - Parse + prepare from a TOML string: [`load_config_str`]
//! - Parse + prepare from a file path: [`load_config_path`]

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use indexmap::IndexSet;
use market_data_ingestor::{
    models::{
        request_params::ProviderParams,
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::alpaca_rest::params::{Adjustment, AlpacaBarsParams, Feed},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::detect::DetectorParams;

/// The watch list scanned when no `tickers` key is configured.
pub const DEFAULT_TICKERS: [&str; 28] = [
    "NVDA", "TSLA", "SOXL", "NFLX", "LLY", "AVGO", "DG", "MARA", "IBIT", "PLTR", "AMZN", "AMD",
    "HOOD", "CLSK", "META", "GOOGL", "MSTR", "SOUN", "BABA", "JD", "MSFT", "CMG", "CRM", "RDDT",
    "OKTA", "AMAT", "LNTH", "TSM",
];

/// Trading days per calendar week, used to turn a `W` lookback into sessions.
const SESSIONS_PER_WEEK: u32 = 5;

/// Longest accepted lookback: roughly one year of trading sessions.
pub const MAX_LOOKBACK_SESSIONS: u32 = 260;

/// Errors raised while loading or validating a [`ScannerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML")]
    Parse(#[from] toml::de::Error),

    #[error("ticker list is empty")]
    NoTickers,

    #[error("ticker symbol cannot be empty after trimming")]
    EmptyTicker,

    #[error("interval {0} is not an intraday bar size (use minutes or hours)")]
    Interval(TimeFrame),

    #[error(
        "lookback {0} must be expressed in trading days (D) or weeks (W), \
         at most {max} sessions",
        max = MAX_LOOKBACK_SESSIONS
    )]
    Lookback(TimeFrame),

    #[error("volume_multiplier must be a positive finite number, got {0}")]
    VolumeMultiplier(f64),

    #[error("{0} must be at least 1")]
    ZeroWindow(&'static str),
}

/// Exchange session settings used to cut the fetched bars down to whole sessions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// IANA time zone the exchange's calendar runs in.
    pub timezone: Tz,
    /// Keep only bars starting inside 09:30-16:00 local time.
    pub regular_hours_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            regular_hours_only: true,
        }
    }
}

/// Alpaca request options passed through on every fetch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlpacaOptions {
    /// Data feed. Defaults to `iex`, the feed free accounts may query intraday.
    pub feed: Option<Feed>,
    pub adjustment: Option<Adjustment>,
}

impl Default for AlpacaOptions {
    fn default() -> Self {
        Self {
            feed: Some(Feed::Iex),
            adjustment: None,
        }
    }
}

impl AlpacaOptions {
    pub fn provider_params(&self) -> ProviderParams {
        if self.feed.is_none() && self.adjustment.is_none() {
            return ProviderParams::None;
        }
        ProviderParams::Alpaca(AlpacaBarsParams {
            feed: self.feed,
            adjustment: self.adjustment,
            ..Default::default()
        })
    }
}

/// Everything one scan needs to know, passed explicitly to the
/// [`Scanner`](crate::scan::Scanner).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Symbols in scan order.
    pub tickers: Vec<String>,
    /// Bar granularity.
    pub interval: TimeFrame,
    /// History window in trading sessions (`"1D"`, `"2D"`, `"1W"`).
    pub lookback: TimeFrame,
    /// Latest volume must exceed this multiple of the trailing mean.
    pub volume_multiplier: f64,
    /// Number of bars before the latest one averaged for volume confirmation.
    pub confirmation_window: usize,
    /// Number of session-opening bars forming the opening range.
    pub opening_range_bars: usize,
    pub session: SessionConfig,
    pub alpaca: AlpacaOptions,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let params = DetectorParams::default();
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            interval: TimeFrame::minutes(5),
            lookback: TimeFrame::days(1),
            volume_multiplier: params.volume_multiplier,
            confirmation_window: params.confirmation_window,
            opening_range_bars: params.opening_range_bars,
            session: SessionConfig::default(),
            alpaca: AlpacaOptions::default(),
        }
    }
}

impl ScannerConfig {
    /// Number of trading sessions the lookback covers, in
    /// `1..=MAX_LOOKBACK_SESSIONS`.
    pub fn lookback_sessions(&self) -> Result<u32, ConfigError> {
        let sessions = match self.lookback.unit {
            TimeFrameUnit::Day => self.lookback.amount,
            TimeFrameUnit::Week => self.lookback.amount.saturating_mul(SESSIONS_PER_WEEK),
            _ => 0,
        };
        if (1..=MAX_LOOKBACK_SESSIONS).contains(&sessions) {
            Ok(sessions)
        } else {
            Err(ConfigError::Lookback(self.lookback))
        }
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            opening_range_bars: self.opening_range_bars,
            confirmation_window: self.confirmation_window,
            volume_multiplier: self.volume_multiplier,
        }
    }

    /// Trims and uppercases tickers and drops duplicates, keeping the first
    /// occurrence's position. Returns how many duplicates were removed.
    pub fn normalize_tickers(&mut self) -> Result<usize, ConfigError> {
        let before = self.tickers.len();
        let mut seen = IndexSet::with_capacity(before);
        for raw in std::mem::take(&mut self.tickers) {
            let ticker = raw.trim().to_uppercase();
            if ticker.is_empty() {
                return Err(ConfigError::EmptyTicker);
            }
            seen.insert(ticker);
        }
        self.tickers = seen.into_iter().collect();
        Ok(before - self.tickers.len())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }
        if !matches!(
            self.interval.unit,
            TimeFrameUnit::Minute | TimeFrameUnit::Hour
        ) || self.interval.amount == 0
        {
            return Err(ConfigError::Interval(self.interval));
        }
        self.lookback_sessions()?;
        if !(self.volume_multiplier.is_finite() && self.volume_multiplier > 0.0) {
            return Err(ConfigError::VolumeMultiplier(self.volume_multiplier));
        }
        if self.confirmation_window == 0 {
            return Err(ConfigError::ZeroWindow("confirmation_window"));
        }
        if self.opening_range_bars == 0 {
            return Err(ConfigError::ZeroWindow("opening_range_bars"));
        }
        Ok(())
    }

    /// Normalizes then validates; call after any programmatic override.
    pub fn prepare(&mut self) -> Result<(), ConfigError> {
        let deduped = self.normalize_tickers()?;
        if deduped > 0 {
            debug!(deduped, "dropped duplicate tickers");
        }
        self.validate()
    }
}

/// Parse and prepare a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> Result<ScannerConfig, ConfigError> {
    let mut config: ScannerConfig = toml::from_str(toml_str)?;
    config.prepare()?;
    Ok(config)
}

/// Read a configuration TOML file from disk, parse, and prepare it.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<ScannerConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_str(&text)
}
