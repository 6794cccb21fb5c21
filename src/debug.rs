//! Trace of outbound API calls.
//!
//! The HTTP transport appends one [`DebugLogEntry`] per request from whatever
//! task performs it, while the UI reads the buffer from the render loop. The
//! buffer is therefore the only piece of state shared across threads outside
//! the message loop, and it is guarded by a mutex.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};

pub const DEFAULT_CAPACITY: usize = 100;

/// Outcome of a traced request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceOutcome {
    Status(u16),
    Error(String),
}

impl fmt::Display for TraceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "{code}"),
            Self::Error(err) => write!(f, "ERR {err}"),
        }
    }
}

/// One HTTP exchange. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLogEntry {
    pub timestamp: DateTime<Local>,
    pub method: String,
    pub url: String,
    pub outcome: TraceOutcome,
    pub duration: Duration,
    pub request_id: String,
}

impl DebugLogEntry {
    pub fn is_error(&self) -> bool {
        match &self.outcome {
            TraceOutcome::Status(code) => *code >= 400,
            TraceOutcome::Error(_) => true,
        }
    }
}

/// Fixed-capacity FIFO of recent requests.
#[derive(Debug)]
pub struct DebugLog {
    capacity: usize,
    entries: Mutex<VecDeque<DebugLogEntry>>,
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DebugLog {
    /// A capacity of zero is bumped to one so the latest call is always visible.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting the oldest ones once over capacity.
    pub fn add_entry(&self, entry: DebugLogEntry) {
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Snapshot of the buffer, oldest first.
    ///
    /// Returns a copy so callers can iterate without holding the lock.
    pub fn entries(&self) -> Vec<DebugLogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DebugLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) fn entry(url: &str) -> DebugLogEntry {
    DebugLogEntry {
        timestamp: Local::now(),
        method: "GET".to_string(),
        url: url.to_string(),
        outcome: TraceOutcome::Status(200),
        duration: Duration::from_millis(12),
        request_id: "req".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_keeps_most_recent_entries_in_order() {
        for (capacity, appended) in [(3, 0), (3, 2), (3, 3), (3, 10), (100, 250)] {
            let log = DebugLog::new(capacity);
            for i in 0..appended {
                log.add_entry(entry(&format!("/call/{i}")));
            }

            let entries = log.entries();
            let expected = appended.min(capacity);
            assert_eq!(entries.len(), expected);

            let urls: Vec<String> = entries.into_iter().map(|e| e.url).collect();
            let wanted: Vec<String> = (appended - expected..appended)
                .map(|i| format!("/call/{i}"))
                .collect();
            assert_eq!(urls, wanted);
        }
    }

    #[test]
    fn test_clear() {
        let log = DebugLog::new(5);
        log.add_entry(entry("/a"));
        log.add_entry(entry("/b"));
        log.clear();
        assert!(log.is_empty());
        log.add_entry(entry("/c"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_entries_is_a_snapshot() {
        let log = DebugLog::new(5);
        log.add_entry(entry("/a"));
        let snapshot = log.entries();
        log.add_entry(entry("/b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let log = DebugLog::new(0);
        log.add_entry(entry("/a"));
        log.add_entry(entry("/b"));
        assert_eq!(log.entries()[0].url, "/b");
    }

    #[test]
    fn test_concurrent_writers() {
        let log = Arc::new(DebugLog::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..100 {
                        log.add_entry(entry(&format!("/t{t}/{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(log.len(), 50);
    }

    #[test]
    fn test_error_detection() {
        let mut e = entry("/a");
        assert!(!e.is_error());
        e.outcome = TraceOutcome::Status(404);
        assert!(e.is_error());
        e.outcome = TraceOutcome::Error("timeout".to_string());
        assert!(e.is_error());
    }
}
