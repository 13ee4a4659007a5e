//! Local persistence for streak records.
//!
//! Records live in a single JSON object keyed by user id, loaded once at
//! startup and rewritten in full after every change:
//!
//! ```json
//! {
//!   "1442360657386147961": { "streak": 3, "lastMessage": 1705314600000 }
//! }
//! ```
//!
//! A missing file is created empty. A file that cannot be read or parsed is
//! treated as empty and overwritten.
//!
//! # Example
//!
//! ```no_run
//! use streak_store::{JsonStore, RecordStore};
//! use streak_types::UserId;
//!
//! let mut store = JsonStore::open_default()?;
//! let user = UserId::new(1442360657386147961);
//! let record = store.get(&user);
//! println!("{} days", record.streak);
//! # Ok::<(), streak_store::Error>(())
//! ```

mod error;
mod store;

pub use error::{Error, Result};
pub use store::{JsonStore, RecordStore};

/// Default store path following platform conventions.
///
/// - Linux: `~/.local/share/streak-bot/rachas.json`
/// - macOS: `~/Library/Application Support/streak-bot/rachas.json`
/// - Windows: `C:\Users\<user>\AppData\Local\streak-bot\rachas.json`
pub fn default_store_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("streak-bot")
        .join("rachas.json")
}
