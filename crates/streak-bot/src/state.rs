//! Application state shared between the event loop and the HTTP API.
//!
//! The event loop is the only writer of the store; the HTTP API takes the
//! same lock to read. The lock is never held across a Discord call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tokio::sync::Mutex;

use streak_store::{JsonStore, RecordStore};

use crate::config::Config;

/// Shared application state.
pub struct AppState<S = JsonStore> {
    /// The streak store.
    pub store: Mutex<S>,
    /// Configuration, fixed for the lifetime of the process.
    pub config: Config,
    /// When the process started.
    pub started_at: OffsetDateTime,
    /// Bot counters.
    pub stats: Stats,
}

impl<S: RecordStore> AppState<S> {
    /// Create new application state.
    pub fn new(store: S, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            config,
            started_at: OffsetDateTime::now_utc(),
            stats: Stats::default(),
        })
    }
}

/// Event counters reported by `/api/health`.
#[derive(Debug, Default)]
pub struct Stats {
    events: AtomicU64,
    streak_updates: AtomicU64,
    failures: AtomicU64,
}

impl Stats {
    pub fn record_event(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_streak_update(&self) {
        self.streak_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Events handled since startup.
    pub fn events(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }

    /// Messages that advanced a streak.
    pub fn streak_updates(&self) -> u64 {
        self.streak_updates.load(Ordering::Relaxed)
    }

    /// Events whose handler or effects failed.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
