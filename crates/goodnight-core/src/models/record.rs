//! Sleep record model

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::format::RecordLocale;

use super::spouse::SpouseLabel;

/// Opaque record identifier assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh time-sortable identifier (UUID v7).
    ///
    /// Only store adapters call this; clients never invent ids.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 13 characters, enough to disambiguate on the command line.
    #[must_use]
    pub fn short(&self) -> String {
        self.0.chars().take(13).collect()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Record ID cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One entry in the shared sleep log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Creation time (Unix ms, creating client's clock)
    pub timestamp: i64,
    /// Creation date, rendered once by the creating device
    pub date_string: String,
    /// Creation time of day, rendered once by the creating device
    pub time_string: String,
    /// Anonymous identity of the creator
    pub user_id: String,
    /// Display label; absent on records written before labels existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<SpouseLabel>,
}

/// Field set submitted to a store when appending a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub timestamp: i64,
    pub date_string: String,
    pub time_string: String,
    pub user_id: String,
    pub user_name: SpouseLabel,
}

impl RecordDraft {
    /// Build a draft stamped at `now`, rendering date and time in `now`'s offset.
    pub fn at<Tz: TimeZone>(
        now: &DateTime<Tz>,
        user_id: impl Into<String>,
        user_name: SpouseLabel,
        locale: RecordLocale,
    ) -> Result<Self> {
        let user_id = user_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("Record user_id cannot be empty".to_string()));
        }

        Ok(Self {
            timestamp: now.timestamp_millis(),
            date_string: locale.date_string(now),
            time_string: locale.time_string(now),
            user_id,
            user_name,
        })
    }

    /// Attach the identifier the store assigned.
    #[must_use]
    pub fn into_record(self, id: RecordId) -> SleepRecord {
        SleepRecord {
            id,
            timestamp: self.timestamp,
            date_string: self.date_string,
            time_string: self.time_string,
            user_id: self.user_id,
            user_name: Some(self.user_name),
        }
    }
}
