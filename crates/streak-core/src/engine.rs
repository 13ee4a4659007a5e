//! The streak state machine.
//!
//! A qualifying message either starts, continues, restarts or leaves a streak
//! untouched depending on how long ago the last counted message was:
//!
//! | Elapsed since last counted message | Result                  |
//! |------------------------------------|-------------------------|
//! | never recorded                     | streak = 1              |
//! | `<= 24h`                           | unchanged (de-dupe)     |
//! | `24h < elapsed <= 48h`             | streak + 1              |
//! | `> 48h`                            | streak = 1              |
//!
//! Both comparisons are inclusive: exactly 24h is still inside the de-dupe
//! window and exactly 48h still continues the streak.
//!
//! Everything here is pure; persistence and notifications belong to callers.

use streak_types::StreakRecord;
use time::{Duration, OffsetDateTime};

/// Only one message per rolling window advances a streak.
pub const DEDUPE_WINDOW: Duration = Duration::hours(24);

/// A message after the de-dupe window but within this bound continues the streak.
pub const GRACE_WINDOW: Duration = Duration::hours(48);

/// How a qualifying message affected a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First ever counted message.
    Started,
    /// Counted within the grace window; the streak grew by one.
    Continued,
    /// Too long since the last counted message; the streak restarted at one.
    Restarted,
    /// Inside the de-dupe window; nothing changed.
    Unchanged,
}

/// Result of running a message through [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub record: StreakRecord,
    pub outcome: Outcome,
}

impl Transition {
    /// Whether the record differs from the input and must be persisted.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.outcome != Outcome::Unchanged
    }
}

/// Compute the next record for a qualifying message at `now`.
///
/// ```
/// use streak_core::engine::{transition, Outcome};
/// use streak_types::StreakRecord;
/// use time::{Duration, OffsetDateTime};
///
/// let t = OffsetDateTime::UNIX_EPOCH;
/// let record = StreakRecord::new(3, Some(t));
///
/// let next = transition(record, t + Duration::hours(30));
/// assert_eq!(next.outcome, Outcome::Continued);
/// assert_eq!(next.record.streak, 4);
/// ```
#[must_use]
pub fn transition(record: StreakRecord, now: OffsetDateTime) -> Transition {
    let (streak, outcome) = match record.last_message {
        None => (1, Outcome::Started),
        Some(last) => {
            let elapsed = now - last;
            if elapsed <= DEDUPE_WINDOW {
                return Transition {
                    record,
                    outcome: Outcome::Unchanged,
                };
            }
            if elapsed <= GRACE_WINDOW {
                (record.streak.saturating_add(1), Outcome::Continued)
            } else {
                (1, Outcome::Restarted)
            }
        }
    };

    Transition {
        record: StreakRecord::new(streak, Some(now)),
        outcome,
    }
}

/// Add `days` to a streak without touching the timestamp.
///
/// Admin adjustments bypass the de-dupe window entirely.
#[must_use]
pub fn add_days(record: StreakRecord, days: u32) -> StreakRecord {
    StreakRecord {
        streak: record.streak.saturating_add(days),
        ..record
    }
}

/// The record a reset leaves behind.
#[must_use]
pub fn reset() -> StreakRecord {
    StreakRecord::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::datetime;

    const T: OffsetDateTime = datetime!(2025-03-01 12:00:00 UTC);

    fn record(streak: u32) -> StreakRecord {
        StreakRecord::new(streak, Some(T))
    }

    #[test]
    fn test_first_message_starts_streak() {
        let next = transition(StreakRecord::default(), T);
        assert_eq!(next.outcome, Outcome::Started);
        assert_eq!(next.record, StreakRecord::new(1, Some(T)));
        assert!(next.changed());
    }

    #[test]
    fn test_unrecorded_admin_streak_starts_over() {
        let next = transition(StreakRecord::new(5, None), T);
        assert_eq!(next.record.streak, 1);
        assert_eq!(next.outcome, Outcome::Started);
    }

    #[test]
    fn test_within_window_is_noop() {
        let next = transition(record(3), T + Duration::hours(10));
        assert_eq!(next.outcome, Outcome::Unchanged);
        assert_eq!(next.record, record(3));
        assert!(!next.changed());
    }

    #[test]
    fn test_grace_window_continues() {
        let now = T + Duration::hours(30);
        let next = transition(record(3), now);
        assert_eq!(next.outcome, Outcome::Continued);
        assert_eq!(next.record, StreakRecord::new(4, Some(now)));
    }

    #[test]
    fn test_long_gap_restarts() {
        let now = T + Duration::hours(72);
        let next = transition(record(3), now);
        assert_eq!(next.outcome, Outcome::Restarted);
        assert_eq!(next.record, StreakRecord::new(1, Some(now)));
    }

    #[test]
    fn test_exactly_24h_is_noop() {
        let next = transition(record(3), T + Duration::hours(24));
        assert_eq!(next.outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_just_over_24h_continues() {
        let next = transition(record(3), T + Duration::hours(24) + Duration::milliseconds(1));
        assert_eq!(next.outcome, Outcome::Continued);
        assert_eq!(next.record.streak, 4);
    }

    #[test]
    fn test_exactly_48h_continues() {
        let next = transition(record(3), T + Duration::hours(48));
        assert_eq!(next.outcome, Outcome::Continued);
        assert_eq!(next.record.streak, 4);
    }

    #[test]
    fn test_just_over_48h_restarts() {
        let next = transition(record(3), T + Duration::hours(48) + Duration::milliseconds(1));
        assert_eq!(next.outcome, Outcome::Restarted);
    }

    #[test]
    fn test_clock_going_backwards_is_noop() {
        let next = transition(record(3), T - Duration::hours(100));
        assert_eq!(next.outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_streak_saturates() {
        let next = transition(record(u32::MAX), T + Duration::hours(30));
        assert_eq!(next.record.streak, u32::MAX);
    }

    #[test]
    fn test_add_days_ignores_timestamp() {
        assert_eq!(add_days(record(3), 5), record(8));
        assert_eq!(
            add_days(StreakRecord::default(), 5),
            StreakRecord::new(5, None)
        );
        assert_eq!(add_days(record(u32::MAX - 1), 5).streak, u32::MAX);
    }

    #[test]
    fn test_reset() {
        assert_eq!(reset(), StreakRecord::new(0, None));
    }

    fn arb_record() -> impl Strategy<Value = StreakRecord> {
        (0u32..10_000).prop_map(record)
    }

    proptest! {
        #[test]
        fn prop_unrecorded_always_starts(streak in 0u32..10_000, offset in -1_000_000i64..1_000_000) {
            let next = transition(StreakRecord::new(streak, None), T + Duration::seconds(offset));
            prop_assert_eq!(next.record.streak, 1);
            prop_assert!(next.changed());
        }

        #[test]
        fn prop_dedupe_window_is_identity(rec in arb_record(), ms in 0i64..=86_400_000) {
            let next = transition(rec, T + Duration::milliseconds(ms));
            prop_assert_eq!(next.record, rec);
            prop_assert!(!next.changed());
        }

        #[test]
        fn prop_grace_window_increments(rec in arb_record(), ms in 86_400_001i64..=172_800_000) {
            let now = T + Duration::milliseconds(ms);
            let next = transition(rec, now);
            prop_assert_eq!(next.record, StreakRecord::new(rec.streak + 1, Some(now)));
            prop_assert!(next.changed());
        }

        #[test]
        fn prop_long_gap_restarts(rec in arb_record(), ms in 172_800_001i64..10_000_000_000) {
            let now = T + Duration::milliseconds(ms);
            let next = transition(rec, now);
            prop_assert_eq!(next.record, StreakRecord::new(1, Some(now)));
        }

        #[test]
        fn prop_feeding_result_back_is_noop(rec in arb_record(), ms in 0i64..10_000_000_000) {
            let now = T + Duration::milliseconds(ms);
            let first = transition(rec, now);
            let second = transition(first.record, now);
            prop_assert_eq!(second.record, first.record);
            prop_assert!(!second.changed());
        }
    }
}
