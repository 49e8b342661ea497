//! Supported update intervals
//!
//! The scheduler only runs at one of a fixed set of intervals. Labels are
//! the strings shown to users and written to the settings file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Update interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    /// Every 60 minutes
    SixtyMinutes,
    /// Every 4 hours
    FourHours,
    /// Every 6 hours
    SixHours,
    /// Every 24 hours
    TwentyFourHours,
}

impl Interval {
    /// All supported intervals, shortest first
    pub const ALL: [Interval; 4] = [
        Interval::SixtyMinutes,
        Interval::FourHours,
        Interval::SixHours,
        Interval::TwentyFourHours,
    ];

    /// Label used in settings and log lines
    pub fn label(&self) -> &'static str {
        match self {
            Interval::SixtyMinutes => "60 minutes",
            Interval::FourHours => "4 hours",
            Interval::SixHours => "6 hours",
            Interval::TwentyFourHours => "24 hours",
        }
    }

    /// Length of the interval in seconds
    pub fn as_secs(&self) -> u64 {
        match self {
            Interval::SixtyMinutes => 3_600,
            Interval::FourHours => 14_400,
            Interval::SixHours => 21_600,
            Interval::TwentyFourHours => 86_400,
        }
    }

    /// Length of the interval as a [`Duration`]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl AsRef<str> for Interval {
    fn as_ref(&self) -> &str {
        self.label()
    }
}

impl FromStr for Interval {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|interval| interval.label() == s)
            .ok_or_else(|| crate::Error::invalid_interval(s))
    }
}

impl TryFrom<String> for Interval {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.label().to_string()
    }
}
