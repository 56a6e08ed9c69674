use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        asset::AssetClass,
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

impl Adjustment {
    pub fn as_str(self) -> &'static str {
        match self {
            Adjustment::Raw => "raw",
            Adjustment::Split => "split",
            Adjustment::Dividend => "dividend",
            Adjustment::All => "all",
        }
    }
}

/// Specifies the source feed for stock data.
///
/// Free Alpaca accounts may only query the `iex` feed for recent bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

impl Feed {
    pub fn as_str(self) -> &'static str {
        match self {
            Feed::Sip => "sip",
            Feed::Iex => "iex",
            Feed::Otc => "otc",
        }
    }
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

impl Sort {
    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
        }
    }
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

/// Maximum page size accepted by the bars endpoint.
pub const MAX_LIMIT: u32 = 10_000;

/// Checks a timeframe against the amounts Alpaca accepts for each unit.
pub fn validate_timeframe(tf: &TimeFrame) -> Result<(), ProviderError> {
    let ok = match tf.unit {
        TimeFrameUnit::Minute => (1..=59).contains(&tf.amount),
        TimeFrameUnit::Hour => (1..=23).contains(&tf.amount),
        TimeFrameUnit::Day | TimeFrameUnit::Week => tf.amount == 1,
        TimeFrameUnit::Month => [1, 2, 3, 6, 12].contains(&tf.amount),
    };
    if ok {
        return Ok(());
    }
    let rule = match tf.unit {
        TimeFrameUnit::Minute => "Minute units can only be used with amounts between 1-59",
        TimeFrameUnit::Hour => "Hour units can only be used with amounts 1-23",
        TimeFrameUnit::Day | TimeFrameUnit::Week => {
            "Day and Week units can only be used with amount 1"
        }
        TimeFrameUnit::Month => "Month units can only be used with amount 1, 2, 3, 6 and 12",
    };
    ValidationSnafu {
        message: format!("{tf}: {rule}"),
    }
    .fail()
}

/// Checks everything about a request that Alpaca would otherwise reject with a 4xx.
pub fn validate_request(params: &BarsRequestParams) -> Result<(), ProviderError> {
    validate_timeframe(&params.timeframe)?;

    if params.asset_class != AssetClass::UsEquity {
        return ValidationSnafu {
            message: format!(
                "the stocks bars endpoint does not serve {:?}",
                params.asset_class
            ),
        }
        .fail();
    }
    if params.symbols.is_empty() || params.symbols.iter().any(|s| s.trim().is_empty()) {
        return ValidationSnafu {
            message: "at least one non-empty symbol is required",
        }
        .fail();
    }
    if params.start >= params.end {
        return ValidationSnafu {
            message: format!("start {} is not before end {}", params.start, params.end),
        }
        .fail();
    }
    if let ProviderParams::Alpaca(AlpacaBarsParams {
        limit: Some(limit), ..
    }) = &params.provider_specific
    {
        if !(1..=MAX_LIMIT).contains(limit) {
            return ValidationSnafu {
                message: format!("limit must be between 1 and {MAX_LIMIT}, got {limit}"),
            }
            .fail();
        }
    }
    Ok(())
}

/// Builds the query string pairs for one page of a bars request.
///
/// The page token is appended by the caller when following pagination.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let symbols = params
        .symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .collect::<Vec<_>>()
        .join(",");

    let mut query = vec![
        ("symbols".to_string(), symbols),
        ("timeframe".to_string(), params.timeframe.to_string()),
        (
            "start".to_string(),
            params.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "end".to_string(),
            params.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    if let ProviderParams::Alpaca(alpaca) = &params.provider_specific {
        if let Some(adjustment) = alpaca.adjustment {
            query.push(("adjustment".to_string(), adjustment.as_str().to_string()));
        }
        if let Some(feed) = alpaca.feed {
            query.push(("feed".to_string(), feed.as_str().to_string()));
        }
        if let Some(currency) = &alpaca.currency {
            query.push(("currency".to_string(), currency.clone()));
        }
        if let Some(limit) = alpaca.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort) = alpaca.sort {
            query.push(("sort".to_string(), sort.as_str().to_string()));
        }
    }

    query
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn request() -> BarsRequestParams {
        BarsRequestParams::single(
            "nvda",
            TimeFrame::minutes(5),
            Utc.with_ymd_and_hms(2025, 3, 3, 13, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 3, 21, 0, 0).unwrap(),
        )
    }

    fn value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn query_carries_universal_fields() {
        let query = construct_params(&request());
        assert_eq!(value(&query, "symbols"), Some("NVDA"));
        assert_eq!(value(&query, "timeframe"), Some("5Min"));
        assert_eq!(value(&query, "start"), Some("2025-03-03T13:00:00Z"));
        assert_eq!(value(&query, "end"), Some("2025-03-03T21:00:00Z"));
        assert_eq!(value(&query, "feed"), None);
    }

    #[test]
    fn query_carries_alpaca_options() {
        let mut params = request();
        params.symbols = vec!["AAPL".into(), " msft ".into()];
        params.provider_specific = ProviderParams::Alpaca(AlpacaBarsParams {
            feed: Some(Feed::Iex),
            sort: Some(Sort::Desc),
            limit: Some(500),
            adjustment: Some(Adjustment::Split),
            currency: None,
        });

        let query = construct_params(&params);
        assert_eq!(value(&query, "symbols"), Some("AAPL,MSFT"));
        assert_eq!(value(&query, "feed"), Some("iex"));
        assert_eq!(value(&query, "sort"), Some("desc"));
        assert_eq!(value(&query, "limit"), Some("500"));
        assert_eq!(value(&query, "adjustment"), Some("split"));
        assert_eq!(value(&query, "currency"), None);
    }

    #[test]
    fn timeframe_rules() {
        assert!(validate_timeframe(&TimeFrame::minutes(5)).is_ok());
        assert!(validate_timeframe(&TimeFrame::hours(23)).is_ok());
        assert!(validate_timeframe(&TimeFrame::days(1)).is_ok());
        assert!(validate_timeframe(&TimeFrame::new(6, TimeFrameUnit::Month)).is_ok());

        assert!(validate_timeframe(&TimeFrame::minutes(60)).is_err());
        assert!(validate_timeframe(&TimeFrame::hours(24)).is_err());
        assert!(validate_timeframe(&TimeFrame::days(2)).is_err());
        assert!(validate_timeframe(&TimeFrame::new(2, TimeFrameUnit::Week)).is_err());
        for amount in [0, 4, 5, 7, 13] {
            assert!(
                validate_timeframe(&TimeFrame::new(amount, TimeFrameUnit::Month)).is_err(),
                "Month with amount {amount} should be invalid"
            );
        }

        let err = validate_timeframe(&TimeFrame::minutes(60)).unwrap_err();
        assert!(err.to_string().contains("Minute units"));
    }

    #[test]
    fn request_rules() {
        assert!(validate_request(&request()).is_ok());

        let mut futures = request();
        futures.asset_class = AssetClass::Futures;
        assert!(validate_request(&futures).is_err());

        let mut empty = request();
        empty.symbols.clear();
        assert!(validate_request(&empty).is_err());

        let mut backwards = request();
        std::mem::swap(&mut backwards.start, &mut backwards.end);
        assert!(validate_request(&backwards).is_err());

        let mut huge = request();
        huge.provider_specific = ProviderParams::Alpaca(AlpacaBarsParams {
            limit: Some(MAX_LIMIT + 1),
            ..Default::default()
        });
        assert!(validate_request(&huge).is_err());
    }
}
