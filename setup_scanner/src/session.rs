//! Cutting a fetched series down to its most recent trading sessions.
//!
//! Providers return whatever falls in the requested window: pre-market and
//! after-hours prints, the tail of the previous session, a weekend gap. The
//! opening range and the running VWAP are only meaningful from the session
//! open, so the scanner keeps the last `sessions` local trading dates and,
//! by default, only bars starting inside regular trading hours.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use market_data_ingestor::models::bar::{Bar, BarSeries};

/// US equities regular session open, local exchange time.
pub const REGULAR_OPEN: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
    Some(t) => t,
    None => panic!("invalid session open"),
};

/// US equities regular session close, local exchange time (exclusive).
pub const REGULAR_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(16, 0, 0) {
    Some(t) => t,
    None => panic!("invalid session close"),
};

#[derive(Debug, Clone, Copy)]
pub struct SessionFilter {
    pub timezone: Tz,
    pub sessions: u32,
    pub regular_hours_only: bool,
}

impl SessionFilter {
    pub fn new(timezone: Tz, sessions: u32, regular_hours_only: bool) -> Self {
        Self {
            timezone,
            sessions,
            regular_hours_only,
        }
    }

    fn local_date(&self, bar: &Bar) -> NaiveDate {
        bar.timestamp.with_timezone(&self.timezone).date_naive()
    }

    fn in_hours(&self, bar: &Bar) -> bool {
        if !self.regular_hours_only {
            return true;
        }
        let local = bar.timestamp.with_timezone(&self.timezone).time();
        (REGULAR_OPEN..REGULAR_CLOSE).contains(&local)
    }

    /// Keeps the bars of the last `sessions` local dates that have any
    /// in-hours bar. Bar order is preserved.
    pub fn latest_sessions(&self, mut series: BarSeries) -> BarSeries {
        series.bars.retain(|bar| self.in_hours(bar));

        let dates: BTreeSet<NaiveDate> = series.bars.iter().map(|b| self.local_date(b)).collect();
        let Some(&first_kept) = dates.iter().rev().take(self.sessions as usize).last() else {
            return series;
        };

        series.bars.retain(|bar| self.local_date(bar) >= first_kept);
        series
    }
}
