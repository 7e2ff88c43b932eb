//! Locale rendering of record timestamps.
//!
//! Date and time strings are rendered once, when a record is created, from the
//! creating device's local offset. They are stored verbatim and never
//! recomputed on read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Locale used to render `dateString`/`timeString`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordLocale {
    /// `2024/1/5`, `下午11:30`
    #[default]
    #[serde(rename = "zh-TW")]
    ZhTw,
    /// `1/5/2024`, `11:30 PM`
    #[serde(rename = "en-US")]
    EnUs,
}

impl RecordLocale {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZhTw => "zh-TW",
            Self::EnUs => "en-US",
        }
    }

    /// Render the calendar date of `at` in its own offset.
    #[must_use]
    pub fn date_string<Tz: TimeZone>(self, at: &DateTime<Tz>) -> String {
        match self {
            Self::ZhTw => format!("{}/{}/{}", at.year(), at.month(), at.day()),
            Self::EnUs => format!("{}/{}/{}", at.month(), at.day(), at.year()),
        }
    }

    /// Render the wall-clock time of `at` as two-digit 12-hour hour and minute.
    #[must_use]
    pub fn time_string<Tz: TimeZone>(self, at: &DateTime<Tz>) -> String {
        let (is_pm, hour) = at.hour12();
        let minute = at.minute();
        match self {
            Self::ZhTw => {
                let period = if is_pm { "下午" } else { "上午" };
                format!("{period}{hour:02}:{minute:02}")
            }
            Self::EnUs => {
                let period = if is_pm { "PM" } else { "AM" };
                format!("{hour:02}:{minute:02} {period}")
            }
        }
    }
}

impl fmt::Display for RecordLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordLocale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zh-tw" => Ok(Self::ZhTw),
            "en-us" => Ok(Self::EnUs),
            other => Err(Error::InvalidInput(format!(
                "Unsupported locale '{other}' (expected zh-TW or en-US)"
            ))),
        }
    }
}
