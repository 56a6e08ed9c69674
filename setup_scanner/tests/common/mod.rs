#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::America::New_York;
use market_data_ingestor::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
        timeframe::TimeFrame,
    },
    providers::{ApiSnafu, DataProvider, ProviderError},
};

/// 2025-03-03 (a Monday) at `h:m` New York time.
pub fn ny(h: u32, m: u32) -> DateTime<Utc> {
    ny_on(3, 3, h, m)
}

pub fn ny_on(month: u32, day: u32, h: u32, m: u32) -> DateTime<Utc> {
    New_York
        .with_ymd_and_hms(2025, month, day, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Flat 5-minute bars (open = high = low = close) from `start`.
pub fn flat_bars(start: DateTime<Utc>, closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
    assert_eq!(closes.len(), volumes.len());
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&c, &v))| Bar::new(start + Duration::minutes(5 * i as i64), c, c, c, c, v))
        .collect()
}

/// Opening bars flat at 10, a dip to 9, then a close at 11 on doubled volume.
pub fn reclaim_session() -> Vec<Bar> {
    flat_bars(
        ny(9, 30),
        &[10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 11.0],
        &[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 200.0],
    )
}

/// Opening range low 10; the latest bar closes at 9.
pub fn breakdown_session() -> Vec<Bar> {
    flat_bars(
        ny(9, 30),
        &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 9.0],
        &[100.0; 7],
    )
}

pub fn quiet_session() -> Vec<Bar> {
    flat_bars(ny(9, 30), &[10.0; 7], &[100.0; 7])
}

/// Time of the scan: just after the seventh bar of the session opened.
pub fn scan_time() -> DateTime<Utc> {
    ny(10, 2)
}

enum Canned {
    Bars(Vec<Bar>),
    Fail(String),
}

/// In-memory provider keyed by symbol, recording every request it sees.
#[derive(Default)]
pub struct FakeProvider {
    canned: HashMap<String, Canned>,
    pub requests: Mutex<Vec<BarsRequestParams>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.canned.insert(symbol.to_string(), Canned::Bars(bars));
        self
    }

    pub fn failing(mut self, symbol: &str, message: &str) -> Self {
        self.canned
            .insert(symbol.to_string(), Canned::Fail(message.to_string()));
        self
    }

    pub fn requested_symbols(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .flat_map(|p| p.symbols.clone())
            .collect()
    }
}

#[async_trait]
impl DataProvider for FakeProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        self.requests.lock().unwrap().push(params.clone());

        let mut out = Vec::new();
        for symbol in &params.symbols {
            match self.canned.get(symbol) {
                Some(Canned::Fail(message)) => {
                    return ApiSnafu {
                        message: message.clone(),
                    }
                    .fail();
                }
                Some(Canned::Bars(bars)) => {
                    out.push(BarSeries::new(symbol.clone(), params.timeframe, bars.clone()));
                }
                None => {}
            }
        }
        Ok(out)
    }
}

pub fn five_minutes() -> TimeFrame {
    TimeFrame::minutes(5)
}
