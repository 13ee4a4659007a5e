//! Core types for streak data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// A Discord user identifier.
///
/// Snowflakes are 64-bit integers, but the API and the store file carry them
/// as decimal strings, so the string form is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UserId(String);

impl UserId {
    /// Create a user id from a raw snowflake.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id.to_string())
    }

    /// The id as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric snowflake.
    ///
    /// Only fails for ids built through `From<String>` without validation.
    pub fn as_u64(&self) -> Result<u64, ParseError> {
        self.0
            .parse()
            .map_err(|_| ParseError::InvalidUserId(self.0.clone()))
    }
}

impl FromStr for UserId {
    type Err = ParseError;

    /// Parse a snowflake, rejecting anything that is not a run of ASCII digits.
    ///
    /// ```
    /// use streak_types::UserId;
    ///
    /// let id: UserId = "80351110224678912".parse().unwrap();
    /// assert_eq!(id.as_str(), "80351110224678912");
    /// assert!("<@80351110224678912>".parse::<UserId>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidUserId(s.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self::new)
            .map_err(|_| ParseError::InvalidUserId(s.to_string()))
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-user streak state.
///
/// `last_message == None` means the user has never had a qualifying message.
/// Admin additions can leave a positive streak with no timestamp; the next
/// qualifying message then starts over at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StreakRecord {
    /// Consecutive qualifying days.
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "non_negative"))]
    pub streak: u32,
    /// Time of the message that last advanced the streak.
    #[cfg_attr(feature = "serde", serde(default, with = "crate::millis::option"))]
    pub last_message: Option<OffsetDateTime>,
}

impl StreakRecord {
    /// Create a record with an explicit streak and timestamp.
    #[must_use]
    pub fn new(streak: u32, last_message: Option<OffsetDateTime>) -> Self {
        Self {
            streak,
            last_message,
        }
    }
}

/// Accept any JSON number for `streak`, clamping negatives and fractions into `u32`.
///
/// Older files could end up with negative counts after a negative admin
/// adjustment; those load as zero instead of failing the whole file.
#[cfg(feature = "serde")]
fn non_negative<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value <= 0.0 {
        return Ok(0);
    }
    Ok(value.trunc().min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_user_id_parse() {
        let id: UserId = "1442360657386147961".parse().unwrap();
        assert_eq!(id.as_str(), "1442360657386147961");
        assert_eq!(id.as_u64().unwrap(), 1_442_360_657_386_147_961);
    }

    #[test]
    fn test_user_id_parse_trims_whitespace() {
        let id: UserId = " 42 ".parse().unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn test_user_id_parse_rejects_garbage() {
        assert!("".parse::<UserId>().is_err());
        assert!("abc".parse::<UserId>().is_err());
        assert!("-5".parse::<UserId>().is_err());
        assert!("99999999999999999999999".parse::<UserId>().is_err());
    }

    #[test]
    fn test_default_record() {
        let record = StreakRecord::default();
        assert_eq!(record.streak, 0);
        assert!(record.last_message.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_wire_format() {
        let record = StreakRecord::new(3, Some(datetime!(2024-01-15 10:30:00 UTC)));
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "streak": 3, "lastMessage": 1_705_314_600_000_i64 })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_null_last_message() {
        let json = serde_json::to_string(&StreakRecord::default()).unwrap();
        assert_eq!(json, r#"{"streak":0,"lastMessage":null}"#);

        let parsed: StreakRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StreakRecord::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_lenient_fields() {
        let parsed: StreakRecord =
            serde_json::from_str(r#"{"streak":-4,"lastMessage":1705314600000.7}"#).unwrap();
        assert_eq!(parsed.streak, 0);
        assert_eq!(
            parsed.last_message,
            Some(datetime!(2024-01-15 10:30:00 UTC))
        );

        let missing: StreakRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(missing, StreakRecord::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_user_id_is_transparent() {
        let id = UserId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""7""#);
    }
}
