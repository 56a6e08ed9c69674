//! Bar interval expressed as an amount and a calendar unit.
//!
//! The textual form is the one Alpaca uses on the wire (`"5Min"`, `"1Hour"`,
//! `"1Day"`, `"1Week"`, `"1Month"`). Parsing is more lenient and also accepts
//! the short CLI forms `"5m"`, `"3h"`, `"1D"`, `"1W"`, `"6M"`.
//!
//! ```
//! use market_data_ingestor::models::timeframe::{TimeFrame, TimeFrameUnit};
//!
//! let tf: TimeFrame = "5m".parse().unwrap();
//! assert_eq!(tf, TimeFrame::new(5, TimeFrameUnit::Minute));
//! assert_eq!(tf.to_string(), "5Min");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeFrameUnit {
    fn suffix(self) -> &'static str {
        match self {
            TimeFrameUnit::Minute => "Min",
            TimeFrameUnit::Hour => "Hour",
            TimeFrameUnit::Day => "Day",
            TimeFrameUnit::Week => "Week",
            TimeFrameUnit::Month => "Month",
        }
    }

    fn parse(unit: &str) -> Option<Self> {
        // Single letters are case-sensitive so that "m" and "M" stay distinct.
        match unit {
            "m" | "T" => return Some(TimeFrameUnit::Minute),
            "M" => return Some(TimeFrameUnit::Month),
            "h" | "H" => return Some(TimeFrameUnit::Hour),
            "d" | "D" => return Some(TimeFrameUnit::Day),
            "w" | "W" => return Some(TimeFrameUnit::Week),
            _ => {}
        }
        match unit.to_lowercase().as_str() {
            "min" | "mins" | "minute" | "minutes" => Some(TimeFrameUnit::Minute),
            "hr" | "hour" | "hours" => Some(TimeFrameUnit::Hour),
            "day" | "days" => Some(TimeFrameUnit::Day),
            "wk" | "week" | "weeks" => Some(TimeFrameUnit::Week),
            "mo" | "month" | "months" => Some(TimeFrameUnit::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    /// Builds a timeframe without validation.
    ///
    /// Which amounts are allowed for a unit is a property of the data vendor,
    /// so each provider validates the timeframe it receives.
    pub const fn new(amount: u32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn minutes(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub const fn hours(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    pub const fn days(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Day)
    }

    /// The fixed length of one bar, or `None` for calendar months.
    pub fn duration(&self) -> Option<chrono::Duration> {
        let amount = i64::from(self.amount);
        match self.unit {
            TimeFrameUnit::Minute => Some(chrono::Duration::minutes(amount)),
            TimeFrameUnit::Hour => Some(chrono::Duration::hours(amount)),
            TimeFrameUnit::Day => Some(chrono::Duration::days(amount)),
            TimeFrameUnit::Week => Some(chrono::Duration::weeks(amount)),
            TimeFrameUnit::Month => None,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeFrameError::InvalidInput {
                message: format!("timeframe {s:?} has no unit"),
            })?;
        let (digits, unit) = s.split_at(split);

        let amount: u32 = digits.parse().map_err(|_| TimeFrameError::InvalidInput {
            message: format!("timeframe {s:?} has no amount"),
        })?;
        let unit = TimeFrameUnit::parse(unit.trim()).ok_or_else(|| TimeFrameError::InvalidInput {
            message: format!("Invalid timeframe unit: {unit}"),
        })?;
        if amount == 0 {
            return Err(TimeFrameError::InvalidAmount {
                unit,
                message: "amount must be greater than zero".into(),
            });
        }

        Ok(Self::new(amount, unit))
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(tf: TimeFrame) -> Self {
        tf.to_string()
    }
}
