//! Leaderboard ordering and pagination.
//!
//! Records are ranked by streak, highest first, and split into pages of
//! [`PAGE_SIZE`]. Equal streaks keep the order they were listed in, so a store
//! that lists by user id yields a deterministic ranking.
//!
//! Page buttons carry their target page in the component id (`top_3`); the
//! previous button on the first page and the next button on the last page are
//! rendered disabled.

use serde::Serialize;
use streak_types::{StreakRecord, UserId};

use crate::error::{Error, Result};

/// Entries per page.
pub const PAGE_SIZE: usize = 10;

const BUTTON_PREFIX: &str = "top_";

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// 1-based position in the full ranking.
    pub rank: usize,
    pub user: UserId,
    pub streak: u32,
}

/// A single page of the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 0-based page index.
    pub index: usize,
    /// Total number of pages, never less than one.
    pub count: usize,
    pub entries: Vec<Entry>,
}

impl Page {
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.count
    }

    /// Component id of the "previous page" button.
    #[must_use]
    pub fn previous_button_id(&self) -> String {
        button_id(self.index as i64 - 1)
    }

    /// Component id of the "next page" button.
    #[must_use]
    pub fn next_button_id(&self) -> String {
        button_id(self.index as i64 + 1)
    }
}

/// Sort records by streak, highest first. The sort is stable.
#[must_use]
pub fn rank(mut records: Vec<(UserId, StreakRecord)>) -> Vec<(UserId, StreakRecord)> {
    records.sort_by(|a, b| b.1.streak.cmp(&a.1.streak));
    records
}

/// Number of pages needed for `total` entries.
#[must_use]
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Build page `requested` of the ranking of `records`.
///
/// Out-of-range requests are clamped to the first or last page.
///
/// ```
/// use streak_core::leaderboard::page;
/// use streak_types::{StreakRecord, UserId};
///
/// let records = (1..=25u64)
///     .map(|n| (UserId::new(n), StreakRecord::new(n as u32, None)))
///     .collect();
/// let second = page(records, 1);
/// assert_eq!(second.count, 3);
/// assert_eq!(second.entries[0].rank, 11);
/// assert_eq!(second.entries[0].streak, 15);
/// ```
#[must_use]
pub fn page(records: Vec<(UserId, StreakRecord)>, requested: i64) -> Page {
    let ranked = rank(records);
    let count = page_count(ranked.len());
    let index = requested.clamp(0, count as i64 - 1) as usize;
    let start = index * PAGE_SIZE;

    let entries = ranked
        .into_iter()
        .enumerate()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|(offset, (user, record))| Entry {
            rank: offset + 1,
            user,
            streak: record.streak,
        })
        .collect();

    Page {
        index,
        count,
        entries,
    }
}

/// Component id for a button that navigates to `page`.
#[must_use]
pub fn button_id(page: i64) -> String {
    format!("{BUTTON_PREFIX}{page}")
}

/// Parse the target page out of a leaderboard button id.
pub fn parse_button_id(id: &str) -> Result<i64> {
    id.strip_prefix(BUTTON_PREFIX)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::UnknownButton(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn records(streaks: &[u32]) -> Vec<(UserId, StreakRecord)> {
        streaks
            .iter()
            .enumerate()
            .map(|(i, s)| (UserId::new(i as u64 + 1), StreakRecord::new(*s, None)))
            .collect()
    }

    #[test]
    fn test_empty_leaderboard_has_one_page() {
        let page = page(Vec::new(), 0);
        assert_eq!(page.count, 1);
        assert!(page.entries.is_empty());
        assert!(!page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_rank_is_descending_and_stable() {
        let ranked = rank(records(&[2, 5, 2, 9]));
        let ids: Vec<_> = ranked.iter().map(|(id, _)| id.as_str().to_string()).collect();
        assert_eq!(ids, ["4", "2", "1", "3"]);
    }

    #[test]
    fn test_navigation_flags() {
        let all = records(&[1; 25]);
        let first = page(all.clone(), 0);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let middle = page(all.clone(), 1);
        assert!(middle.has_previous());
        assert!(middle.has_next());

        let last = page(all, 2);
        assert!(last.has_previous());
        assert!(!last.has_next());
        assert_eq!(last.entries.len(), 5);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        assert_eq!(page_count(20), 2);
        assert_eq!(page_count(21), 3);
        assert!(!page(records(&[1; 20]), 1).has_next());
    }

    #[test]
    fn test_out_of_range_requests_clamp() {
        let all = records(&[1; 15]);
        assert_eq!(page(all.clone(), -3).index, 0);
        assert_eq!(page(all, 99).index, 1);
    }

    #[test]
    fn test_button_ids() {
        let first = page(records(&[1; 15]), 0);
        assert_eq!(first.previous_button_id(), "top_-1");
        assert_eq!(first.next_button_id(), "top_1");
        assert_eq!(parse_button_id("top_-1"), Ok(-1));
        assert_eq!(parse_button_id("top_12"), Ok(12));
        assert!(parse_button_id("top_x").is_err());
        assert!(parse_button_id("other_1").is_err());
    }

    proptest! {
        #[test]
        fn prop_pages_are_ordered_slices(streaks in prop::collection::vec(0u32..50, 0..60), k in 0usize..7) {
            let all = records(&streaks);
            let ranked = rank(all.clone());
            let view = page(all, k as i64);

            for pair in ranked.windows(2) {
                prop_assert!(pair[0].1.streak >= pair[1].1.streak);
            }

            if k < page_count(streaks.len()) {
                let expected: Vec<_> = ranked.iter().skip(k * PAGE_SIZE).take(PAGE_SIZE).collect();
                prop_assert_eq!(view.entries.len(), expected.len());
                for (entry, (user, record)) in view.entries.iter().zip(expected) {
                    prop_assert_eq!(&entry.user, user);
                    prop_assert_eq!(entry.streak, record.streak);
                }
                if let Some(first) = view.entries.first() {
                    prop_assert_eq!(first.rank, k * PAGE_SIZE + 1);
                }
            }
        }
    }
}
