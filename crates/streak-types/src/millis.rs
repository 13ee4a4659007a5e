//! Epoch-millisecond timestamps.
//!
//! The store file keeps `lastMessage` as integer milliseconds since the Unix
//! epoch, so every timestamp that passes through a [`StreakRecord`] is held at
//! millisecond precision.
//!
//! [`StreakRecord`]: crate::StreakRecord

use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};

/// Convert a timestamp to epoch milliseconds, dropping sub-millisecond precision.
#[must_use]
pub fn to_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Build a timestamp from epoch milliseconds.
pub fn from_millis(ms: i64) -> ParseResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map_err(|_| ParseError::TimestampOutOfRange(ms))
}

/// Truncate a timestamp to millisecond precision.
#[must_use]
pub fn truncate(at: OffsetDateTime) -> OffsetDateTime {
    let nanos = at.nanosecond();
    at - time::Duration::nanoseconds(i64::from(nanos % 1_000_000))
}

/// Current UTC time at millisecond precision.
#[must_use]
pub fn now() -> OffsetDateTime {
    truncate(OffsetDateTime::now_utc())
}

/// Serde adapter for `Option<OffsetDateTime>` stored as epoch milliseconds or `null`.
///
/// Fractional values are accepted on read and truncated, since older files
/// may have been written by tools that emit floats.
#[cfg(feature = "serde")]
pub mod option {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => serializer.serialize_i64(super::to_millis(*at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptionalMillis)
    }

    struct OptionalMillis;

    impl<'de> Visitor<'de> for OptionalMillis {
        type Value = Option<OffsetDateTime>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("epoch milliseconds or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_i64<E: de::Error>(self, ms: i64) -> Result<Self::Value, E> {
            super::from_millis(ms).map(Some).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, ms: u64) -> Result<Self::Value, E> {
            let ms = i64::try_from(ms).map_err(|_| E::custom("timestamp out of range"))?;
            self.visit_i64(ms)
        }

        fn visit_f64<E: de::Error>(self, ms: f64) -> Result<Self::Value, E> {
            if !ms.is_finite() {
                return Err(E::custom("timestamp is not a finite number"));
            }
            self.visit_i64(ms.trunc() as i64)
        }
    }
}
