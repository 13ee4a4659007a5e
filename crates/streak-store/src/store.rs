//! Main store implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use streak_types::{StreakRecord, UserId};

use crate::error::{Error, Result};

/// Key-value access to streak records.
///
/// `set` must be durable before it returns; the next `get` or `list_all`
/// observes it.
pub trait RecordStore: Send {
    /// Get a user's record, creating the default on first reference.
    fn get(&mut self, user: &UserId) -> StreakRecord;

    /// Look up a record without creating it.
    fn peek(&self, user: &UserId) -> Option<StreakRecord>;

    /// Replace a user's record and flush.
    fn set(&mut self, user: &UserId, record: StreakRecord) -> Result<()>;

    /// All records, ordered by user id.
    fn list_all(&self) -> Vec<(UserId, StreakRecord)>;

    /// Put a user's record back to the default and flush.
    fn reset(&mut self, user: &UserId) -> Result<()> {
        self.set(user, StreakRecord::default())
    }
}

/// JSON-file-backed record store.
///
/// The whole mapping is held in memory and rewritten on every change. Writes
/// go to a sibling temp file that is renamed over the original, so a crash
/// mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonStore {
    path: Option<PathBuf>,
    records: BTreeMap<UserId, StreakRecord>,
}

impl JsonStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening streak store at {}", path.display());

        let mut store = Self {
            path: Some(path.to_path_buf()),
            records: BTreeMap::new(),
        };

        if !path.exists() {
            debug!("Store file missing, creating empty store");
            store.flush()?;
            return Ok(store);
        }

        match load(path) {
            Ok(records) => {
                info!("Loaded {} streak record(s)", records.len());
                store.records = records;
            }
            Err(e) => {
                warn!("{}, starting empty", e);
                store.flush()?;
            }
        }

        Ok(store)
    }

    /// Load an existing store for inspection.
    ///
    /// Unlike [`open`](Self::open), a missing or malformed file is an error
    /// and nothing on disk is created or rewritten. The returned store has
    /// no file backing, so later changes stay in memory.
    pub fn load_readonly<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let records = load(path)?;
        debug!("Loaded {} record(s) from {} read-only", records.len(), path.display());
        Ok(Self {
            path: None,
            records,
        })
    }

    /// Open the default store location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_store_path())
    }

    /// Open a store with no file backing (for testing).
    pub fn open_in_memory() -> Self {
        Self {
            path: None,
            records: BTreeMap::new(),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rewrite the backing file from memory.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.records)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| Error::Write {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, path).map_err(|e| Error::Write {
            path: path.clone(),
            source: e,
        })?;

        debug!("Flushed {} record(s) to {}", self.records.len(), path.display());
        Ok(())
    }
}

impl RecordStore for JsonStore {
    fn get(&mut self, user: &UserId) -> StreakRecord {
        *self.records.entry(user.clone()).or_default()
    }

    fn peek(&self, user: &UserId) -> Option<StreakRecord> {
        self.records.get(user).copied()
    }

    fn set(&mut self, user: &UserId, record: StreakRecord) -> Result<()> {
        self.records.insert(user.clone(), record);
        self.flush()
    }

    fn list_all(&self) -> Vec<(UserId, StreakRecord)> {
        self.records
            .iter()
            .map(|(user, record)| (user.clone(), *record))
            .collect()
    }
}

fn load(path: &Path) -> Result<BTreeMap<UserId, StreakRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn test_get_creates_default() {
        let mut store = JsonStore::open_in_memory();
        assert!(store.peek(&user(1)).is_none());

        let record = store.get(&user(1));
        assert_eq!(record, StreakRecord::default());
        assert_eq!(store.peek(&user(1)), Some(StreakRecord::default()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_then_get() {
        let mut store = JsonStore::open_in_memory();
        let record = StreakRecord::new(4, Some(datetime!(2025-01-01 00:00 UTC)));
        store.set(&user(1), record).unwrap();
        assert_eq!(store.get(&user(1)), record);
    }

    #[test]
    fn test_reset_keeps_the_key() {
        let mut store = JsonStore::open_in_memory();
        store.set(&user(1), StreakRecord::new(9, None)).unwrap();
        store.reset(&user(1)).unwrap();
        assert_eq!(store.peek(&user(1)), Some(StreakRecord::default()));
        assert_eq!(store.list_all().len(), 1);
    }

    #[test]
    fn test_list_all_orders_by_user_id() {
        let mut store = JsonStore::open_in_memory();
        store.set(&user(30), StreakRecord::new(1, None)).unwrap();
        store.set(&user(10), StreakRecord::new(2, None)).unwrap();
        store.set(&user(20), StreakRecord::new(3, None)).unwrap();

        let ids: Vec<_> = store
            .list_all()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, ["10", "20", "30"]);
    }

    #[test]
    fn test_open_creates_missing_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("rachas.json");

        let store = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_set_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        let at = datetime!(2024-01-15 10:30:00 UTC);

        {
            let mut store = JsonStore::open(&path).unwrap();
            store.set(&user(42), StreakRecord::new(3, Some(at))).unwrap();
        }

        let mut reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.get(&user(42)), StreakRecord::new(3, Some(at)));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        let mut store = JsonStore::open(&path).unwrap();
        store
            .set(
                &user(42),
                StreakRecord::new(3, Some(datetime!(2024-01-15 10:30:00 UTC))),
            )
            .unwrap();
        store.set(&user(7), StreakRecord::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "42": { "streak": 3, "lastMessage": 1_705_314_600_000_i64 },
                "7": { "streak": 0, "lastMessage": null }
            })
        );
        assert!(content.contains("\n  \"42\": {"));
    }

    #[test]
    fn test_malformed_file_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_wrong_shape_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_loads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        std::fs::write(
            &path,
            r#"{
  "100": { "streak": 5, "lastMessage": 1705314600000 },
  "200": { "streak": 0, "lastMessage": null }
}"#,
        )
        .unwrap();

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.peek(&UserId::from("100")),
            Some(StreakRecord::new(
                5,
                Some(datetime!(2024-01-15 10:30:00 UTC))
            ))
        );
    }

    #[test]
    fn test_write_failure_keeps_new_value_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let mut store = JsonStore::open(data.join("rachas.json")).unwrap();
        std::fs::remove_dir_all(&data).unwrap();

        let record = StreakRecord::new(2, Some(datetime!(2025-01-01 00:00 UTC)));
        let err = store.set(&user(1), record).unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(store.peek(&user(1)), Some(record));
    }

    #[test]
    fn test_load_readonly_reads_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        let content = r#"{ "100": { "streak": 5, "lastMessage": null } }"#;
        std::fs::write(&path, content).unwrap();

        let mut store = JsonStore::load_readonly(&path).unwrap();
        assert_eq!(store.peek(&UserId::from("100")), Some(StreakRecord::new(5, None)));
        assert!(store.path().is_none());

        store.set(&user(1), StreakRecord::new(1, None)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_load_readonly_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        let truncated = r#"{"42": {"streak": 9, "lastMessage": 1705314600000},"#;
        std::fs::write(&path, truncated).unwrap();

        let err = JsonStore::load_readonly(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), truncated);
    }

    #[test]
    fn test_load_readonly_missing_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo").join("rachas.json");

        let err = JsonStore::load_readonly(&path).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert!(!dir.path().join("typo").exists());
    }
}
