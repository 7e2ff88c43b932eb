//! Display label model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One of the two household display labels a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpouseLabel {
    #[serde(rename = "spouse-A")]
    SpouseA,
    #[serde(rename = "spouse-B")]
    SpouseB,
}

impl SpouseLabel {
    /// Every selectable label, in display order.
    pub const ALL: [Self; 2] = [Self::SpouseA, Self::SpouseB];

    /// Canonical wire form of the label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpouseA => "spouse-A",
            Self::SpouseB => "spouse-B",
        }
    }
}

impl fmt::Display for SpouseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpouseLabel {
    type Err = Error;

    /// Accepts the canonical form in any case, and the short `a`/`b` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spouse-a" | "a" => Ok(Self::SpouseA),
            "spouse-b" | "b" => Ok(Self::SpouseB),
            other => Err(Error::InvalidInput(format!(
                "Unknown label '{other}' (expected spouse-A or spouse-B)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_and_short_forms() {
        assert_eq!("spouse-A".parse::<SpouseLabel>().unwrap(), SpouseLabel::SpouseA);
        assert_eq!(" SPOUSE-b ".parse::<SpouseLabel>().unwrap(), SpouseLabel::SpouseB);
        assert_eq!("a".parse::<SpouseLabel>().unwrap(), SpouseLabel::SpouseA);
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        assert!("spouse-C".parse::<SpouseLabel>().is_err());
        assert!("".parse::<SpouseLabel>().is_err());
    }

    #[test]
    fn serde_uses_canonical_form() {
        let json = serde_json::to_string(&SpouseLabel::SpouseB).unwrap();
        assert_eq!(json, "\"spouse-B\"");
        let parsed: SpouseLabel = serde_json::from_str("\"spouse-A\"").unwrap();
        assert_eq!(parsed, SpouseLabel::SpouseA);
    }
}
