//! The scan loop: fetch, trim to session, normalize, detect, per ticker.
//!
//! Tickers are processed one after another in configured order. A ticker that
//! cannot be fetched, has no usable bars, or cannot be evaluated simply
//! produces no result; each of those outcomes is logged and counted in
//! [`ScanStats`] so that a quiet scan and a broken one can be told apart in
//! the logs.

use chrono::{DateTime, Duration, Utc};
use market_data_ingestor::{
    models::{
        asset::AssetClass,
        bar::BarSeries,
        request_params::BarsRequestParams,
    },
    providers::{DataProvider, ProviderError},
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, ScannerConfig},
    detect::{EvaluationError, SetupDetector, SetupSet},
    normalize::{UnusableSeries, normalize},
    session::SessionFilter,
};

/// Calendar days added to the fetch window so weekends and holidays still
/// leave enough sessions in it.
const CALENDAR_SLACK_DAYS: i64 = 4;

/// One ticker with at least one triggered setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupResult {
    pub ticker: String,
    pub setups: SetupSet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub scanned: usize,
    pub retrieval_failures: usize,
    pub unusable_series: usize,
    pub evaluation_failures: usize,
}

impl ScanStats {
    pub fn failures(&self) -> usize {
        self.retrieval_failures + self.unusable_series + self.evaluation_failures
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub results: Vec<SetupResult>,
    pub stats: ScanStats,
}

impl ScanReport {
    fn new(scanned_at: DateTime<Utc>) -> Self {
        Self {
            scanned_at,
            results: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Number of tickers with a setup.
    pub fn setup_count(&self) -> usize {
        self.results.len()
    }
}

/// What happened to one ticker.
#[derive(Debug)]
pub enum TickerOutcome {
    Setups(SetupSet),
    NoSetups,
    RetrievalFailed(ProviderError),
    Unusable(UnusableSeries),
    EvaluationFailed(EvaluationError),
}

pub struct Scanner<P> {
    provider: P,
    config: ScannerConfig,
    detector: SetupDetector,
    sessions: SessionFilter,
}

impl<P: DataProvider> Scanner<P> {
    /// Prepares `config` (see [`ScannerConfig::prepare`]) and builds a scanner.
    pub fn new(provider: P, mut config: ScannerConfig) -> Result<Self, ConfigError> {
        config.prepare()?;
        let sessions = SessionFilter::new(
            config.session.timezone,
            config.lookback_sessions()?,
            config.session.regular_hours_only,
        );
        Ok(Self {
            provider,
            detector: SetupDetector::new(config.detector_params()),
            sessions,
            config,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The bars request issued for `ticker` when scanning at `now`.
    pub fn request_for(&self, ticker: &str, now: DateTime<Utc>) -> BarsRequestParams {
        let sessions = i64::from(self.sessions.sessions);
        let days = sessions * 7 / 5 + CALENDAR_SLACK_DAYS;
        BarsRequestParams {
            symbols: vec![ticker.to_string()],
            timeframe: self.config.interval,
            start: now - Duration::days(days),
            end: now,
            asset_class: AssetClass::UsEquity,
            provider_specific: self.config.alpaca.provider_params(),
        }
    }

    pub async fn scan_ticker(&self, ticker: &str, now: DateTime<Utc>) -> TickerOutcome {
        let fetched = match self.provider.fetch_bars(self.request_for(ticker, now)).await {
            Ok(series) => series,
            Err(err) => return TickerOutcome::RetrievalFailed(err),
        };

        // No series for the symbol means the vendor had nothing in the window.
        let raw = fetched
            .into_iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(ticker))
            .unwrap_or_else(|| BarSeries::new(ticker, self.config.interval, Vec::new()));

        let session = self.sessions.latest_sessions(raw);
        let annotated = match normalize(&session) {
            Ok(annotated) => annotated,
            Err(err) => return TickerOutcome::Unusable(err),
        };

        match self.detector.detect(&annotated) {
            Ok(setups) if setups.is_empty() => TickerOutcome::NoSetups,
            Ok(setups) => TickerOutcome::Setups(setups),
            Err(err) => TickerOutcome::EvaluationFailed(err),
        }
    }

    pub async fn scan(&self) -> ScanReport {
        self.scan_at(Utc::now()).await
    }

    /// Runs one scan as if the current time were `now`.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> ScanReport {
        let mut report = ScanReport::new(now);

        for ticker in &self.config.tickers {
            report.stats.scanned += 1;
            match self.scan_ticker(ticker, now).await {
                TickerOutcome::Setups(setups) => {
                    info!(ticker = %ticker, setups = ?setups, "setup found");
                    report.results.push(SetupResult {
                        ticker: ticker.clone(),
                        setups,
                    });
                }
                TickerOutcome::NoSetups => debug!(ticker = %ticker, "no setup"),
                TickerOutcome::RetrievalFailed(err) => {
                    warn!(ticker = %ticker, error = %err, "bar retrieval failed, skipping");
                    report.stats.retrieval_failures += 1;
                }
                TickerOutcome::Unusable(err) => {
                    debug!(ticker = %ticker, error = %err, "no usable bars");
                    report.stats.unusable_series += 1;
                }
                TickerOutcome::EvaluationFailed(err) => {
                    warn!(ticker = %ticker, error = %err, "could not evaluate setups");
                    report.stats.evaluation_failures += 1;
                }
            }
        }

        info!(
            scanned = report.stats.scanned,
            setups = report.setup_count(),
            retrieval_failures = report.stats.retrieval_failures,
            unusable = report.stats.unusable_series,
            evaluation_failures = report.stats.evaluation_failures,
            "scan complete"
        );
        report
    }
}
