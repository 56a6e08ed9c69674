mod common;

use chrono::Duration;
use common::*;
use market_data_ingestor::{
    models::{asset::AssetClass, bar::Bar, request_params::ProviderParams},
    providers::alpaca_rest::params::Feed,
};
use setup_scanner::{
    Scanner, ScannerConfig, SetupLabel,
    config::ConfigError,
    scan::{ScanStats, TickerOutcome},
};

fn config(tickers: &[&str]) -> ScannerConfig {
    ScannerConfig {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

fn labels(report: &setup_scanner::ScanReport) -> Vec<(String, Vec<SetupLabel>)> {
    report
        .results
        .iter()
        .map(|r| (r.ticker.clone(), r.setups.iter().copied().collect()))
        .collect()
}

#[tokio::test]
async fn failing_ticker_is_skipped_and_counted() {
    let provider = FakeProvider::new()
        .with_bars("AMD", reclaim_session())
        .failing("XYZ", "invalid symbol: XYZ")
        .with_bars("TSLA", breakdown_session());

    let scanner = Scanner::new(provider, config(&["AMD", "XYZ", "TSLA"])).unwrap();
    let report = scanner.scan_at(scan_time()).await;

    assert_eq!(
        labels(&report),
        [
            ("AMD".to_string(), vec![SetupLabel::VwapReclaim]),
            ("TSLA".to_string(), vec![SetupLabel::OrbBreakdown]),
        ]
    );
    assert_eq!(
        report.stats,
        ScanStats {
            scanned: 3,
            retrieval_failures: 1,
            unusable_series: 0,
            evaluation_failures: 0,
        }
    );
}

#[tokio::test]
async fn results_follow_ticker_order() {
    let provider = FakeProvider::new()
        .with_bars("NVDA", breakdown_session())
        .with_bars("META", quiet_session())
        .with_bars("AMD", reclaim_session());

    let scanner = Scanner::new(provider, config(&["nvda", "META", "AMD"])).unwrap();
    let report = scanner.scan_at(scan_time()).await;

    let tickers: Vec<_> = report.results.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["NVDA", "AMD"]);
    assert_eq!(report.stats.scanned, 3);
    assert_eq!(report.stats.failures(), 0);
    assert_eq!(report.scanned_at, scan_time());
}

#[tokio::test]
async fn previous_session_and_extended_hours_are_ignored() {
    // Without session trimming the Friday low of 5 would set the opening
    // range, and the Monday close at 9 would not be a breakdown.
    let mut bars = flat_bars(ny_on(2, 28, 9, 30), &[5.0, 5.0, 5.0], &[100.0; 3]);
    bars.extend(flat_bars(ny(8, 0), &[5.0], &[5000.0]));
    bars.extend(breakdown_session());
    bars.extend(flat_bars(ny(16, 0), &[4.0], &[100.0]));

    let provider = FakeProvider::new().with_bars("PLTR", bars);
    let scanner = Scanner::new(provider, config(&["PLTR"])).unwrap();
    let report = scanner.scan_at(scan_time()).await;

    assert_eq!(
        labels(&report),
        [("PLTR".to_string(), vec![SetupLabel::OrbBreakdown])]
    );
}

#[tokio::test]
async fn missing_or_garbage_series_is_unusable() {
    let mut garbage: Vec<Bar> = quiet_session();
    for bar in &mut garbage {
        bar.close = f64::NAN;
    }

    let provider = FakeProvider::new().with_bars("HOOD", garbage);
    let scanner = Scanner::new(provider, config(&["HOOD", "RDDT"])).unwrap();

    assert!(matches!(
        scanner.scan_ticker("RDDT", scan_time()).await,
        TickerOutcome::Unusable(_)
    ));

    let report = scanner.scan_at(scan_time()).await;
    assert!(report.results.is_empty());
    assert_eq!(report.stats.unusable_series, 2);
    assert_eq!(report.stats.retrieval_failures, 0);
}

#[tokio::test]
async fn too_few_bars_is_a_clean_miss() {
    let provider = FakeProvider::new().with_bars("DG", reclaim_session()[..2].to_vec());
    let scanner = Scanner::new(provider, config(&["DG"])).unwrap();

    assert!(matches!(
        scanner.scan_ticker("DG", scan_time()).await,
        TickerOutcome::NoSetups
    ));
}

#[tokio::test]
async fn one_request_per_ticker_with_configured_window() {
    let scanner = Scanner::new(FakeProvider::new(), config(&["AMD", "MSFT"])).unwrap();
    let now = scan_time();
    scanner.scan_at(now).await;
    assert_eq!(scanner.provider().requested_symbols(), ["AMD", "MSFT"]);

    let request = scanner.request_for("AMD", now);
    assert_eq!(request.symbols, ["AMD"]);
    assert_eq!(request.timeframe, five_minutes());
    assert_eq!(request.end, now);
    assert_eq!(request.start, now - Duration::days(5));
    assert_eq!(request.asset_class, AssetClass::UsEquity);
    match request.provider_specific {
        ProviderParams::Alpaca(p) => assert_eq!(p.feed, Some(Feed::Iex)),
        other => panic!("expected alpaca params, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let err = Scanner::new(FakeProvider::new(), config(&[])).err().unwrap();
    assert!(matches!(err, ConfigError::NoTickers));
}

#[tokio::test]
async fn oversized_lookback_is_rejected_before_scanning() {
    let mut config = config(&["AMD"]);
    config.lookback = "100000000D".parse().unwrap();

    let err = Scanner::new(FakeProvider::new(), config).err().unwrap();
    assert!(matches!(err, ConfigError::Lookback(_)));
}
