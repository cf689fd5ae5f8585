//! Process-wide sensor state: the latest reading and its rolling history.
//!
//! Created once in `main` with the default reading and an empty history,
//! mutated only through [`SensorState::ingest`], and dropped on exit. The
//! HTTP layer shares it as [`SharedSensorState`]; ingestion holds the write
//! lock, analysis copies a [`Snapshot`] under the read lock so a pass never
//! sees a half-applied update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::history::ReadingHistory;
use crate::models::{SensorReading, TimedReading};

// ---

pub type SharedSensorState = Arc<RwLock<SensorState>>;

#[derive(Debug, Clone)]
pub struct SensorState {
    // ---
    current: TimedReading,
    history: ReadingHistory,
}

/// Consistent copy of the state taken for one analysis pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The most recent reading (or the startup default).
    pub current: TimedReading,
    /// Readings that preceded `current`, oldest first.
    pub prior: ReadingHistory,
}

impl SensorState {
    // ---
    pub fn new(history_capacity: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            current: SensorReading::default().at(started_at),
            history: ReadingHistory::new(history_capacity),
        }
    }

    pub fn shared(self) -> SharedSensorState {
        Arc::new(RwLock::new(self))
    }

    pub fn current(&self) -> &TimedReading {
        &self.current
    }

    pub fn history(&self) -> &ReadingHistory {
        &self.history
    }

    /// Make `reading` current and append it to the history.
    pub fn ingest(&mut self, reading: SensorReading, at: DateTime<Utc>) -> TimedReading {
        // ---
        let entry = reading.at(at);
        if let Some(evicted) = self.history.push(entry) {
            tracing::trace!("History full, evicted reading from {}", evicted.timestamp);
        }
        self.current = entry;
        entry
    }

    /// Current reading plus the history that preceded it.
    pub fn snapshot(&self) -> Snapshot {
        // ---
        let mut prior = self.history.clone();
        // The startup default never enters the history, so only strip the
        // newest entry when it is the current reading.
        if prior.latest() == Some(&self.current) {
            prior.pop_latest();
        }
        Snapshot {
            current: self.current,
            prior,
        }
    }
}
