//! Alpaca Market Data v2 REST provider for US equities.
//!
//! - [`params`]: Alpaca-specific request options and query construction.
//! - [`response`]: wire types for the `/v2/stocks/bars` response.
//! - [`provider`]: the [`AlpacaProvider`] implementing
//!   [`DataProvider`](crate::providers::DataProvider).

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{AlpacaConfig, AlpacaProvider};
