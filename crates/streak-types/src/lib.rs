//! Platform-agnostic types for the daily streak bot.
//!
//! This crate holds the data shared by the engine, the store and the Discord
//! binding: user identifiers, the per-user [`StreakRecord`], and the
//! epoch-millisecond helpers that define the on-disk timestamp format.
//!
//! # Example
//!
//! ```
//! use streak_types::{StreakRecord, UserId};
//!
//! let user: UserId = "1442360657386147961".parse()?;
//! let record = StreakRecord::default();
//! assert_eq!(record.streak, 0);
//! # Ok::<(), streak_types::ParseError>(())
//! ```

pub mod error;
pub mod millis;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{StreakRecord, UserId};
