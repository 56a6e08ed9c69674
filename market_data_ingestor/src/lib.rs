//! Vendor-agnostic market data models and providers.
//!
//! [`models`] holds the canonical bar types every provider produces, and
//! [`providers`] defines the [`DataProvider`](providers::DataProvider) trait
//! together with the concrete Alpaca REST implementation.

pub mod models;
pub mod providers;
