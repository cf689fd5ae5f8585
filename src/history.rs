//! Bounded rolling window of recent readings.

use std::collections::VecDeque;

use crate::models::{Field, TimedReading};

// ---

/// Population mean and standard deviation of one field over the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub samples: usize,
    pub mean: f64,
    pub stddev: f64,
}

/// Insertion-ordered ring buffer holding at most `capacity` readings.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    // ---
    entries: VecDeque<TimedReading>,
    capacity: usize,
}

impl ReadingHistory {
    // ---
    /// Create an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, returning the evicted oldest entry when full.
    pub fn push(&mut self, entry: TimedReading) -> Option<TimedReading> {
        // ---
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Remove and return the newest entry.
    pub fn pop_latest(&mut self) -> Option<TimedReading> {
        self.entries.pop_back()
    }

    pub fn latest(&self) -> Option<&TimedReading> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimedReading> {
        self.entries.iter()
    }

    /// Mean and population standard deviation of `field`, or `None` when the
    /// window is empty.
    pub fn stats(&self, field: Field) -> Option<FieldStats> {
        // ---
        let n = self.entries.len();
        if n == 0 {
            return None;
        }

        let mean = self.iter().map(|e| e.reading.get(field)).sum::<f64>() / n as f64;
        let variance = self
            .iter()
            .map(|e| {
                let d = e.reading.get(field) - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;

        Some(FieldStats {
            samples: n,
            mean,
            stddev: variance.sqrt(),
        })
    }
}
