use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::Bar;

/// One bar as returned by `/v2/stocks/bars`.
///
/// Price and volume keys are optional on the wire; an absent key becomes
/// `NaN` in the canonical [`Bar`] so that downstream cleaning can drop it.
#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o", default)]
    pub open: Option<f64>,
    #[serde(rename = "h", default)]
    pub high: Option<f64>,
    #[serde(rename = "l", default)]
    pub low: Option<f64>,
    #[serde(rename = "c", default)]
    pub close: Option<f64>,
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl From<AlpacaBar> for Bar {
    fn from(ab: AlpacaBar) -> Self {
        Bar {
            timestamp: ab.timestamp,
            open: ab.open.unwrap_or(f64::NAN),
            high: ab.high.unwrap_or(f64::NAN),
            low: ab.low.unwrap_or(f64::NAN),
            close: ab.close.unwrap_or(f64::NAN),
            volume: ab.volume.unwrap_or(f64::NAN),
            trade_count: ab.trade_count,
            vwap: ab.vwap,
        }
    }
}

/// One page of a bars response. `bars` is `null` when nothing matched.
#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Error body Alpaca sends alongside 4xx/5xx statuses.
#[derive(Deserialize, Debug)]
pub struct AlpacaErrorBody {
    #[serde(default)]
    pub code: Option<u64>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_page_with_pagination_token() {
        let body = r#"{
            "bars": {
                "NVDA": [
                    {"t":"2025-03-03T14:30:00Z","o":120.1,"h":121.0,"l":119.8,"c":120.5,"v":1500000,"n":9000,"vw":120.4},
                    {"t":"2025-03-03T14:35:00Z","o":120.5,"h":120.9,"l":120.0,"c":120.2,"v":900000,"n":7000,"vw":120.3}
                ],
                "TSLA": [
                    {"t":"2025-03-03T14:30:00Z","o":280.0,"h":281.0,"l":279.0,"c":280.5,"v":700000,"n":5000,"vw":280.2}
                ]
            },
            "next_page_token": "TlZEQXwyMDI1"
        }"#;

        let page: AlpacaResponse = serde_json::from_str(body).unwrap();
        let bars = page.bars.unwrap();
        assert_eq!(bars.keys().collect::<Vec<_>>(), ["NVDA", "TSLA"]);
        assert_eq!(bars["NVDA"].len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("TlZEQXwyMDI1"));

        let bar: Bar = bars.into_iter().next().unwrap().1.remove(0).into();
        assert_eq!(bar.close, 120.5);
        assert_eq!(bar.volume, 1_500_000.0);
        assert_eq!(bar.trade_count, Some(9000));
        assert_eq!(bar.vwap, Some(120.4));
    }

    #[test]
    fn null_bars_and_missing_token_parse() {
        let page: AlpacaResponse =
            serde_json::from_str(r#"{"bars":null,"next_page_token":null}"#).unwrap();
        assert!(page.bars.is_none());
        assert!(page.next_page_token.is_none());

        let page: AlpacaResponse = serde_json::from_str(r#"{"bars":{}}"#).unwrap();
        assert!(page.bars.unwrap().is_empty());
    }

    #[test]
    fn missing_fields_become_nan() {
        let ab: AlpacaBar =
            serde_json::from_str(r#"{"t":"2025-03-03T14:30:00Z","o":1.0,"h":2.0,"l":0.5}"#)
                .unwrap();
        let bar = Bar::from(ab);
        assert!(bar.close.is_nan());
        assert!(bar.volume.is_nan());
        assert!(!bar.is_complete());
        assert_eq!(bar.trade_count, None);
    }

    #[test]
    fn parses_error_body() {
        let body: AlpacaErrorBody =
            serde_json::from_str(r#"{"code":42210000,"message":"invalid timeframe"}"#).unwrap();
        assert_eq!(body.code, Some(42210000));
        assert_eq!(body.message, "invalid timeframe");
    }
}
