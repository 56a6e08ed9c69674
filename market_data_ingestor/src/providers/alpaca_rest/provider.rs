use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::{get_env_var, non_empty_env_var, parse_env_var};
use snafu::ResultExt;
use tracing::{debug, trace};

use crate::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, InvalidApiKeySnafu, InvalidEnvVarSnafu,
        MissingEnvVarSnafu, ProviderError, ProviderInitError, ReqwestSnafu,
        alpaca_rest::{
            params::{construct_params, validate_request},
            response::{AlpacaBar, AlpacaErrorBody, AlpacaResponse},
        },
    },
};

pub const BASE_URL: &str = "https://data.alpaca.markets/v2/stocks/bars";

/// Alpaca's documented request budget for the free data plan.
pub const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = nonzero!(200u32);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to talk to the Alpaca data API.
#[derive(Debug)]
pub struct AlpacaConfig {
    pub api_key: SecretString,
    pub secret_key: SecretString,
    /// Full URL of the bars endpoint.
    pub base_url: String,
    pub requests_per_minute: NonZeroU32,
    pub timeout: Duration,
}

impl AlpacaConfig {
    /// Reads the configuration from the environment.
    ///
    /// Required: `APCA_API_KEY_ID`, `APCA_API_SECRET_KEY`.
    /// Optional: `APCA_DATA_URL` (bars endpoint override),
    /// `APCA_REQUESTS_PER_MINUTE`, `APCA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(
            get_env_var("APCA_API_KEY_ID")
                .context(MissingEnvVarSnafu)?
                .into(),
        );
        let secret_key = SecretString::new(
            get_env_var("APCA_API_SECRET_KEY")
                .context(MissingEnvVarSnafu)?
                .into(),
        );

        let base_url = non_empty_env_var("APCA_DATA_URL").unwrap_or_else(|| BASE_URL.to_string());
        let requests_per_minute = parse_env_var::<NonZeroU32>("APCA_REQUESTS_PER_MINUTE")
            .context(InvalidEnvVarSnafu)?
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);
        let timeout = parse_env_var::<u64>("APCA_TIMEOUT_SECS")
            .context(InvalidEnvVarSnafu)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            api_key,
            secret_key,
            base_url,
            requests_per_minute,
            timeout,
        })
    }
}

pub struct AlpacaProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider from the environment.
    ///
    /// See [`AlpacaConfig::from_env`] for the variables read.
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::with_config(AlpacaConfig::from_env()?)
    }

    pub fn with_config(config: AlpacaConfig) -> Result<Self, ProviderInitError> {
        let mut api_key = header::HeaderValue::from_str(config.api_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        api_key.set_sensitive(true);
        let mut secret_key = header::HeaderValue::from_str(config.secret_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        secret_key.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("APCA-API-KEY-ID", api_key);
        headers.insert("APCA-API-SECRET-KEY", secret_key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: config.base_url,
            limiter: RateLimiter::direct(Quota::per_minute(config.requests_per_minute)),
        })
    }

    async fn fetch_page(
        &self,
        query: &[(String, String)],
    ) -> Result<AlpacaResponse, ProviderError> {
        self.limiter.until_ready().await;

        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            let message = serde_json::from_str::<AlpacaErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return ApiSnafu {
                message: format!("{status}: {message}"),
            }
            .fail();
        }

        response.json::<AlpacaResponse>().await.context(ReqwestSnafu)
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        validate_request(&params)?;

        let mut all_bars: IndexMap<String, Vec<AlpacaBar>> = IndexMap::new();
        let mut next_page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query_params = construct_params(&params);
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let page = self.fetch_page(&query_params).await?;
            pages += 1;
            trace!(pages, "received bars page");

            // Merge the bars from the current page into our collection.
            for (symbol, bars) in page.bars.unwrap_or_default() {
                all_bars.entry(symbol).or_default().extend(bars);
            }

            match page.next_page_token {
                Some(token) if next_page_token.as_deref() == Some(token.as_str()) => {
                    // A repeated token would loop forever.
                    return ApiSnafu {
                        message: format!("pagination token repeated: {token}"),
                    }
                    .fail();
                }
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        debug!(
            symbols = all_bars.len(),
            pages,
            timeframe = %params.timeframe,
            "fetched bars from alpaca"
        );

        let result = all_bars
            .into_iter()
            .map(|(symbol, alpaca_bars)| {
                BarSeries::new(
                    symbol,
                    params.timeframe,
                    alpaca_bars.into_iter().map(Bar::from).collect(),
                )
            })
            .collect();

        Ok(result)
    }
}
