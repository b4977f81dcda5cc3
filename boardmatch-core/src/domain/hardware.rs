use instant::Instant;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// How many entries the display feed keeps by default.
pub const DEFAULT_LOG_CAPACITY: usize = 10;

/// Monotonic timestamp in milliseconds since the process anchor.
///
/// Serializable and comparable; uses instant::Instant internally so the
/// same code runs on WASM targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The current moment, relative to a process-wide anchor.
    pub fn now() -> Self {
        static ANCHOR: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let anchor = ANCHOR.get_or_init(Instant::now);

        let elapsed = Instant::now().duration_since(*anchor);
        Timestamp(elapsed.as_millis() as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Build from a raw milliseconds value (deterministic tests).
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    /// Milliseconds elapsed between this timestamp and now.
    pub fn elapsed_millis(&self) -> u64 {
        Timestamp::now().0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    /// Clock-style `mm:ss.mmm` since the process anchor.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 60_000;
        let seconds = (self.0 / 1_000) % 60;
        let millis = self.0 % 1_000;
        write!(f, "{:02}:{:02}.{:03}", minutes, seconds, millis)
    }
}

/// One line of the hardware activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareLogEntry {
    timestamp: Timestamp,
    message: String,
}

impl HardwareLogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        HardwareLogEntry {
            timestamp: Timestamp::now(),
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HardwareLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

/// Bounded, most-recent-first feed of hardware activity lines.
///
/// Append-only from the session's point of view and never read back by it;
/// the feed exists purely for a display consumer. Oldest entries fall off
/// once the capacity is reached.
#[derive(Debug, Clone)]
pub struct HardwareLog {
    entries: VecDeque<HardwareLogEntry>,
    capacity: usize,
}

impl HardwareLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HardwareLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, stamped now. Newest entries sit at the front.
    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push_front(HardwareLogEntry::new(message));
        self.entries.truncate(self.capacity);
    }

    /// Entries newest-first.
    pub fn entries(&self) -> impl Iterator<Item = &HardwareLogEntry> {
        self.entries.iter()
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
}

impl Default for HardwareLog {
    fn default() -> Self {
        Self::new()
    }
}
