//! Bounded, newest-first display log.

use std::collections::VecDeque;

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Default number of entries kept by the on-page log.
pub const DEFAULT_LOG_CAP: usize = 50;

/// Details text of the entry left behind by [`EventLog::clear`].
pub const CLEARED_SENTINEL: &str = "Event log cleared...";

/// One formatted, timestamped observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    pub category: String,
    pub details: String,
}

impl LogEntry {
    /// Entry stamped with the current local time.
    pub fn now(category: impl Into<String>, details: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            category: category.into(),
            details: details.into(),
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.timestamp, self.category, self.details)
    }
}

/// Newest-first sequence capped at a fixed size. Pushing past the cap
/// evicts from the tail (oldest first).
///
/// Every entry gets a sequence number when it is pushed. Numbers are never
/// reused, not even across [`EventLog::clear`], so they can key rendered rows.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<(u64, LogEntry)>,
    cap: usize,
    next_seq: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAP)
    }
}

impl EventLog {
    /// A cap of zero is treated as one.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        EventLog {
            entries: VecDeque::with_capacity(cap + 1),
            cap,
            next_seq: 0,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend `entry`, then trim the oldest entries down to the cap.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front((self.next_seq, entry));
        self.next_seq += 1;
        while self.entries.len() > self.cap {
            self.entries.pop_back();
        }
    }

    /// Empty the log, leaving only the "cleared" sentinel.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.push(LogEntry::now("Log", CLEARED_SENTINEL));
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front().map(|(_, e)| e)
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().map(|(_, e)| e)
    }

    /// Entries with their sequence numbers, newest first.
    pub fn iter_keyed(&self) -> impl Iterator<Item = (u64, &LogEntry)> {
        self.entries.iter().map(|(seq, e)| (*seq, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: usize) -> LogEntry {
        LogEntry::now("Test", format!("#{i}"))
    }

    #[test]
    fn test_newest_first() {
        let mut log = EventLog::new(5);
        for i in 0..3 {
            log.push(entry(i));
        }
        let details: Vec<_> = log.iter().map(|e| e.details.as_str()).collect();
        assert_eq!(details, vec!["#2", "#1", "#0"]);
    }

    #[test]
    fn test_cap_50_evicts_oldest() {
        let mut log = EventLog::new(50);
        for i in 0..51 {
            log.push(entry(i));
            assert!(log.len() <= 50);
        }
        assert_eq!(log.len(), 50);
        assert_eq!(log.latest().unwrap().details, "#50");
        assert_eq!(log.iter().last().unwrap().details, "#1");
        assert!(log.iter().all(|e| e.details != "#0"));
    }

    #[test]
    fn test_cap_3_variant() {
        let mut log = EventLog::new(3);
        for i in 0..10 {
            log.push(entry(i));
        }
        let details: Vec<_> = log.iter().map(|e| e.details.as_str()).collect();
        assert_eq!(details, vec!["#9", "#8", "#7"]);
    }

    #[test]
    fn test_zero_cap_clamped() {
        let mut log = EventLog::new(0);
        log.push(entry(0));
        log.push(entry(1));
        assert_eq!(log.cap(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_clear_leaves_sentinel() {
        let mut log = EventLog::new(3);
        log.clear();
        assert_eq!(log.len(), 1);
        for i in 0..7 {
            log.push(entry(i));
        }
        log.clear();
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().details, CLEARED_SENTINEL);
    }

    #[test]
    fn test_sequence_numbers_survive_eviction_and_clear() {
        let mut log = EventLog::new(2);
        for i in 0..3 {
            log.push(entry(i));
        }
        let seqs: Vec<u64> = log.iter_keyed().map(|(seq, _)| seq).collect();
        assert_eq!(seqs, vec![2, 1]);

        log.clear();
        log.push(entry(3));
        let seqs: Vec<u64> = log.iter_keyed().map(|(seq, _)| seq).collect();
        assert_eq!(seqs, vec![4, 3]);
    }

    #[test]
    fn test_display() {
        let e = LogEntry {
            timestamp: "12:00:00".into(),
            category: "Mouse".into(),
            details: "click".into(),
        };
        assert_eq!(e.to_string(), "[12:00:00] Mouse: click");
    }
}
