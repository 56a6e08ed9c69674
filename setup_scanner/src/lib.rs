//! Intraday setup scanner.
//!
//! One scan fetches recent intraday bars for every configured ticker, keeps
//! the latest regular-hours session, annotates it with a running VWAP and
//! checks two setups against the last two bars:
//!
//! - **ORB Breakdown**: the latest close is below the opening-range low.
//! - **VWAP Reclaim**: price closed below VWAP on the previous bar and above it
//!   on the latest, on confirming volume, and not during a breakdown.
//!
//! The pipeline is [`session`] → [`normalize`] → [`detect`], driven per ticker
//! by [`scan::Scanner`] and presented by [`render`].

pub mod config;
pub mod detect;
pub mod normalize;
pub mod render;
pub mod scan;
pub mod session;

pub use config::ScannerConfig;
pub use detect::{SetupDetector, SetupLabel};
pub use scan::{ScanReport, Scanner};
