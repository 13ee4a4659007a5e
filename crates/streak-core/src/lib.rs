//! Streak engine and presentation logic for the daily streak bot.
//!
//! Everything in this crate is pure and synchronous:
//!
//! - [`engine`]: the start / continue / restart / hold state machine and the
//!   admin adjustments that bypass it
//! - [`nickname`]: streak labels embedded in member nicknames
//! - [`progress`]: the fixed-width progress bar
//! - [`leaderboard`]: ranking, pagination and page button ids
//! - [`access`]: staff role checks for admin commands
//!
//! # Example
//!
//! ```
//! use streak_core::{engine, nickname, progress};
//! use streak_types::StreakRecord;
//! use time::OffsetDateTime;
//!
//! let next = engine::transition(StreakRecord::default(), OffsetDateTime::now_utc());
//! assert!(next.changed());
//! assert_eq!(nickname::render("Luna", next.record.streak), "Luna ✦ 🔥 1");
//! assert!(progress::bar(next.record.streak).starts_with('█'));
//! ```

pub mod access;
pub mod engine;
mod error;
pub mod leaderboard;
pub mod nickname;
pub mod progress;

pub use access::StaffRoles;
pub use engine::{Outcome, Transition};
pub use error::{Error, Result};
pub use leaderboard::{Entry, Page};
pub use nickname::NicknameChange;
